//! Database repository for capture pages.

use crate::db::{
    errors::{DbError, Result},
    filter::{ListFilter, ListQuery, Predicate, Predicates, expect_single, fetch_page},
    handlers::repository::Repository,
    models::capture_pages::{CapturePageCreateDBRequest, CapturePageDBResponse, CapturePageUpdateDBRequest},
    pagination::Paginated,
    settings::{QuerySettings, bounded},
    transaction::TransactionHandler,
};
use crate::types::{CapturePageId, CapturePageTypeId, CategoryId, Entity, OrganizationId};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};
use tracing::instrument;

/// Filter for listing capture pages
#[derive(Debug, Clone, Default)]
pub struct CapturePageFilter {
    pub ids_in: Vec<CapturePageId>,
    pub name_in: Vec<String>,
    pub type_id_in: Vec<CapturePageTypeId>,
    pub organization_id_in: Vec<OrganizationId>,
    pub category_id_in: Vec<CategoryId>,
    pub is_active: Option<bool>,
    pub page: Option<i64>,
    pub max_rows: Option<i64>,
}

impl ListFilter for CapturePageFilter {
    fn predicates(&self) -> Vec<Predicate> {
        Predicates::new()
            .any("p.id", &self.ids_in)
            .any("p.name", &self.name_in)
            .any("p.type_id", &self.type_id_in)
            .any("p.organization_id", &self.organization_id_in)
            .any("p.category_id", &self.category_id_in)
            .eq("p.is_active", self.is_active)
            .finish()
    }

    fn page(&self) -> Option<i64> {
        self.page
    }

    fn max_rows(&self) -> Option<i64> {
        self.max_rows
    }
}

#[derive(Debug, Clone, FromRow)]
struct CapturePage {
    pub id: CapturePageId,
    pub organization_id: OrganizationId,
    pub category_id: Option<CategoryId>,
    pub type_id: CapturePageTypeId,
    pub type_name: String,
    pub name: String,
    pub title: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CapturePage> for CapturePageDBResponse {
    fn from(page: CapturePage) -> Self {
        Self {
            id: page.id,
            organization_id: page.organization_id,
            category_id: page.category_id,
            type_id: page.type_id,
            type_name: page.type_name,
            name: page.name,
            title: page.title,
            is_active: page.is_active,
            created_at: page.created_at,
            updated_at: page.updated_at,
        }
    }
}

struct CapturePageList;

impl ListQuery for CapturePageList {
    type Row = CapturePage;
    type Filter = CapturePageFilter;

    const ENTITY: Entity = Entity::CapturePage;
    const SELECT: &'static str = "SELECT p.id, p.organization_id, p.category_id, p.type_id, pt.name AS type_name, p.name, \
                                  p.title, p.is_active, p.created_at, p.updated_at";
    const FROM: &'static str = "FROM capture_pages p INNER JOIN capture_page_types pt ON pt.id = p.type_id";
    const ORDER_BY: &'static str = "p.id";
}

pub struct CapturePages<'c> {
    db: &'c mut PgConnection,
    settings: QuerySettings,
}

#[async_trait::async_trait]
impl<'c> Repository for CapturePages<'c> {
    type CreateRequest = CapturePageCreateDBRequest;
    type UpdateRequest = CapturePageUpdateDBRequest;
    type Response = CapturePageDBResponse;
    type Id = CapturePageId;
    type Filter = CapturePageFilter;

    #[instrument(skip(self, request), fields(organization_id = request.organization_id, name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let id: CapturePageId = bounded(
            self.settings.timeouts.exec,
            "insert capture page",
            sqlx::query_scalar(
                r#"
                INSERT INTO capture_pages (organization_id, category_id, type_id, name, title, is_active)
                VALUES ($1, $2, $3, $4, $5, COALESCE($6, TRUE))
                RETURNING id
                "#,
            )
            .bind(request.organization_id)
            .bind(request.category_id)
            .bind(request.type_id)
            .bind(&request.name)
            .bind(&request.title)
            .bind(request.is_active)
            .fetch_one(&mut *self.db),
        )
        .await?;

        self.get_by_id(id).await.map_err(|e| e.context("create failed"))
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Self::Response> {
        let filter = CapturePageFilter {
            ids_in: vec![id],
            ..Default::default()
        };
        expect_single(self.list(Some(&filter)).await?, Entity::CapturePage)
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: Option<&Self::Filter>) -> Result<Paginated<Self::Response>> {
        let default = CapturePageFilter::default();
        let filter = filter.unwrap_or(&default);

        let page = fetch_page::<CapturePageList>(&mut *self.db, &self.settings, filter).await?;
        Ok(page.map(CapturePageDBResponse::from))
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = bounded(
            self.settings.timeouts.exec,
            "delete capture page",
            sqlx::query("DELETE FROM capture_pages WHERE id = $1").bind(id).execute(&mut *self.db),
        )
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        // $2 says whether category_id was given at all; $3 may then be NULL to detach
        let result = bounded(
            self.settings.timeouts.exec,
            "update capture page",
            sqlx::query(
                r#"
                UPDATE capture_pages SET
                    category_id = CASE WHEN $2 THEN $3 ELSE category_id END,
                    type_id = COALESCE($4, type_id),
                    name = COALESCE($5, name),
                    title = COALESCE($6, title),
                    is_active = COALESCE($7, is_active),
                    updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(id)
            .bind(request.category_id.is_some())
            .bind(request.category_id.flatten())
            .bind(request.type_id)
            .bind(&request.name)
            .bind(&request.title)
            .bind(request.is_active)
            .execute(&mut *self.db),
        )
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        self.get_by_id(id).await.map_err(|e| e.context("update failed"))
    }
}

impl<'c> CapturePages<'c> {
    pub fn new<H: TransactionHandler + ?Sized>(handler: &'c mut H) -> Self {
        let settings = *handler.settings();
        Self {
            db: handler.as_executor(),
            settings,
        }
    }

    /// Get the capture page named `name` inside an organization
    #[instrument(skip(self), err)]
    pub async fn get_by_name(&mut self, organization_id: OrganizationId, name: &str) -> Result<CapturePageDBResponse> {
        let filter = CapturePageFilter {
            name_in: vec![name.to_string()],
            organization_id_in: vec![organization_id],
            ..Default::default()
        };
        expect_single(self.list(Some(&filter)).await?, Entity::CapturePage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::Categories;
    use crate::test_utils::{create_test_category, create_test_controller, create_test_organization};
    use sqlx::PgPool;

    fn create_request(organization_id: OrganizationId, category_id: Option<CategoryId>, name: &str) -> CapturePageCreateDBRequest {
        CapturePageCreateDBRequest {
            organization_id,
            category_id,
            type_id: 1,
            name: name.to_string(),
            title: Some(format!("Title of {name}")),
            is_active: None,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_get_by_id(pool: PgPool) {
        let controller = create_test_controller(pool).await;
        let mut tx = controller.tx().await.unwrap();
        let org = create_test_organization(&mut tx, "acme").await;
        let category = create_test_category(&mut tx, org.id, "spring").await;

        let mut repo = CapturePages::new(&mut tx);
        let created = repo.create(&create_request(org.id, Some(category.id), "signup")).await.unwrap();
        let fetched = repo.get_by_id(created.id).await.unwrap();

        assert_eq!(created, fetched);
        assert_eq!(fetched.category_id, Some(category.id));
        assert_eq!(fetched.type_name, "landing");
        assert!(fetched.is_active);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_by_category(pool: PgPool) {
        let controller = create_test_controller(pool).await;
        let mut tx = controller.tx().await.unwrap();
        let org = create_test_organization(&mut tx, "acme").await;
        let spring = create_test_category(&mut tx, org.id, "spring").await;
        let autumn = create_test_category(&mut tx, org.id, "autumn").await;

        let mut repo = CapturePages::new(&mut tx);
        repo.create(&create_request(org.id, Some(spring.id), "one")).await.unwrap();
        repo.create(&create_request(org.id, Some(autumn.id), "two")).await.unwrap();
        repo.create(&create_request(org.id, Some(spring.id), "three")).await.unwrap();
        repo.create(&create_request(org.id, None, "loose")).await.unwrap();

        let filter = CapturePageFilter {
            category_id_in: vec![spring.id],
            ..Default::default()
        };
        let page = repo.list(Some(&filter)).await.unwrap();
        let names: Vec<&str> = page.items.iter().map(|p| p.name.as_str()).collect();

        assert_eq!(page.pagination.total_count, 2);
        assert_eq!(names, vec!["one", "three"]);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_unknown_name_is_empty(pool: PgPool) {
        let controller = create_test_controller(pool).await;
        let mut db = controller.db().await.unwrap();

        let filter = CapturePageFilter {
            name_in: vec!["nonexistent".to_string()],
            ..Default::default()
        };
        let page = CapturePages::new(&mut db).list(Some(&filter)).await.unwrap();

        assert_eq!(page.pagination.row_count, 0);
        assert!(page.items.is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_detaches_category(pool: PgPool) {
        let controller = create_test_controller(pool).await;
        let mut tx = controller.tx().await.unwrap();
        let org = create_test_organization(&mut tx, "acme").await;
        let category = create_test_category(&mut tx, org.id, "spring").await;

        let mut repo = CapturePages::new(&mut tx);
        let created = repo.create(&create_request(org.id, Some(category.id), "signup")).await.unwrap();

        // Leaving category_id out keeps the link
        let renamed = repo
            .update(
                created.id,
                &CapturePageUpdateDBRequest {
                    name: Some("register".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "register");
        assert_eq!(renamed.category_id, Some(category.id));

        let detached = repo
            .update(
                created.id,
                &CapturePageUpdateDBRequest {
                    category_id: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(detached.category_id, None);
        assert_eq!(detached.name, "register");
        assert_eq!(detached.title, created.title);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_deleting_category_detaches_pages(pool: PgPool) {
        let controller = create_test_controller(pool).await;
        let mut tx = controller.tx().await.unwrap();
        let org = create_test_organization(&mut tx, "acme").await;
        let category = create_test_category(&mut tx, org.id, "spring").await;

        let created = CapturePages::new(&mut tx)
            .create(&create_request(org.id, Some(category.id), "signup"))
            .await
            .unwrap();
        assert!(Categories::new(&mut tx).delete(category.id).await.unwrap());

        let fetched = CapturePages::new(&mut tx).get_by_id(created.id).await.unwrap();
        assert_eq!(fetched.category_id, None);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_get_by_name(pool: PgPool) {
        let controller = create_test_controller(pool).await;
        let mut tx = controller.tx().await.unwrap();
        let org = create_test_organization(&mut tx, "acme").await;

        let mut repo = CapturePages::new(&mut tx);
        let created = repo.create(&create_request(org.id, None, "signup")).await.unwrap();

        assert_eq!(repo.get_by_name(org.id, "signup").await.unwrap().id, created.id);
        assert!(matches!(
            repo.get_by_name(org.id, "other").await,
            Err(DbError::AmbiguousOrMissingEntry {
                entity: Entity::CapturePage,
                found: 0
            })
        ));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_name_conflicts(pool: PgPool) {
        let controller = create_test_controller(pool).await;
        let mut db = controller.db().await.unwrap();
        let org = create_test_organization(&mut db, "acme").await;

        let mut repo = CapturePages::new(&mut db);
        repo.create(&create_request(org.id, None, "signup")).await.unwrap();
        let result = repo.create(&create_request(org.id, None, "signup")).await;

        assert!(matches!(result, Err(DbError::UniqueViolation { .. })));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete(pool: PgPool) {
        let controller = create_test_controller(pool).await;
        let mut tx = controller.tx().await.unwrap();
        let org = create_test_organization(&mut tx, "acme").await;

        let mut repo = CapturePages::new(&mut tx);
        let created = repo.create(&create_request(org.id, None, "signup")).await.unwrap();

        assert!(repo.delete(created.id).await.unwrap());
        assert!(!repo.delete(created.id).await.unwrap());
        assert!(matches!(
            repo.get_by_id(created.id).await,
            Err(DbError::AmbiguousOrMissingEntry { found: 0, .. })
        ));
    }
}

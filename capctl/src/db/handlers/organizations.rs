//! Database repository for organizations.

use crate::db::{
    errors::{DbError, Result},
    filter::{ListFilter, ListQuery, Predicate, Predicates, expect_single, fetch_page},
    handlers::repository::Repository,
    models::organizations::{OrganizationCreateDBRequest, OrganizationDBResponse, OrganizationUpdateDBRequest},
    pagination::Paginated,
    settings::{QuerySettings, bounded},
    transaction::TransactionHandler,
};
use crate::types::{Entity, OrganizationId};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};
use tracing::instrument;

/// Filter for listing organizations
#[derive(Debug, Clone, Default)]
pub struct OrganizationFilter {
    pub ids_in: Vec<OrganizationId>,
    pub name_in: Vec<String>,
    pub page: Option<i64>,
    pub max_rows: Option<i64>,
}

impl ListFilter for OrganizationFilter {
    fn predicates(&self) -> Vec<Predicate> {
        Predicates::new().any("o.id", &self.ids_in).any("o.name", &self.name_in).finish()
    }

    fn page(&self) -> Option<i64> {
        self.page
    }

    fn max_rows(&self) -> Option<i64> {
        self.max_rows
    }
}

#[derive(Debug, Clone, FromRow)]
struct Organization {
    pub id: OrganizationId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Organization> for OrganizationDBResponse {
    fn from(org: Organization) -> Self {
        Self {
            id: org.id,
            name: org.name,
            description: org.description,
            created_at: org.created_at,
            updated_at: org.updated_at,
        }
    }
}

struct OrganizationList;

impl ListQuery for OrganizationList {
    type Row = Organization;
    type Filter = OrganizationFilter;

    const ENTITY: Entity = Entity::Organization;
    const SELECT: &'static str = "SELECT o.id, o.name, o.description, o.created_at, o.updated_at";
    const FROM: &'static str = "FROM organizations o";
    const ORDER_BY: &'static str = "o.id";
}

pub struct Organizations<'c> {
    db: &'c mut PgConnection,
    settings: QuerySettings,
}

#[async_trait::async_trait]
impl<'c> Repository for Organizations<'c> {
    type CreateRequest = OrganizationCreateDBRequest;
    type UpdateRequest = OrganizationUpdateDBRequest;
    type Response = OrganizationDBResponse;
    type Id = OrganizationId;
    type Filter = OrganizationFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let id: OrganizationId = bounded(
            self.settings.timeouts.exec,
            "insert organization",
            sqlx::query_scalar("INSERT INTO organizations (name, description) VALUES ($1, $2) RETURNING id")
                .bind(&request.name)
                .bind(&request.description)
                .fetch_one(&mut *self.db),
        )
        .await?;

        self.get_by_id(id).await.map_err(|e| e.context("create failed"))
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Self::Response> {
        let filter = OrganizationFilter {
            ids_in: vec![id],
            ..Default::default()
        };
        expect_single(self.list(Some(&filter)).await?, Entity::Organization)
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: Option<&Self::Filter>) -> Result<Paginated<Self::Response>> {
        let default = OrganizationFilter::default();
        let filter = filter.unwrap_or(&default);

        let page = fetch_page::<OrganizationList>(&mut *self.db, &self.settings, filter).await?;
        Ok(page.map(OrganizationDBResponse::from))
    }

    /// Deleting an organization removes everything it owns.
    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = bounded(
            self.settings.timeouts.exec,
            "delete organization",
            sqlx::query("DELETE FROM organizations WHERE id = $1").bind(id).execute(&mut *self.db),
        )
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let result = bounded(
            self.settings.timeouts.exec,
            "update organization",
            sqlx::query(
                r#"
                UPDATE organizations SET
                    name = COALESCE($2, name),
                    description = COALESCE($3, description),
                    updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(id)
            .bind(&request.name)
            .bind(&request.description)
            .execute(&mut *self.db),
        )
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        self.get_by_id(id).await.map_err(|e| e.context("update failed"))
    }
}

impl<'c> Organizations<'c> {
    pub fn new<H: TransactionHandler + ?Sized>(handler: &'c mut H) -> Self {
        let settings = *handler.settings();
        Self {
            db: handler.as_executor(),
            settings,
        }
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_name(&mut self, name: &str) -> Result<OrganizationDBResponse> {
        let filter = OrganizationFilter {
            name_in: vec![name.to_string()],
            ..Default::default()
        };
        expect_single(self.list(Some(&filter)).await?, Entity::Organization)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::{Categories, CategoryFilter};
    use crate::test_utils::{create_test_category, create_test_controller};
    use sqlx::PgPool;

    fn create_request(name: &str) -> OrganizationCreateDBRequest {
        OrganizationCreateDBRequest {
            name: name.to_string(),
            description: None,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_get(pool: PgPool) {
        let controller = create_test_controller(pool).await;
        let mut tx = controller.tx().await.unwrap();

        let mut repo = Organizations::new(&mut tx);
        let created = repo.create(&create_request("acme")).await.unwrap();

        assert_eq!(repo.get_by_id(created.id).await.unwrap(), created);
        assert_eq!(repo.get_by_name("acme").await.unwrap(), created);
        assert_eq!(created.description, None);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_name_conflicts(pool: PgPool) {
        let controller = create_test_controller(pool).await;
        let mut db = controller.db().await.unwrap();

        let mut repo = Organizations::new(&mut db);
        repo.create(&create_request("acme")).await.unwrap();

        match repo.create(&create_request("acme")).await {
            Err(DbError::UniqueViolation { constraint, .. }) => {
                assert_eq!(constraint.as_deref(), Some("organizations_name_unique"))
            }
            other => panic!("Expected UniqueViolation error, got {other:?}"),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_filters(pool: PgPool) {
        let controller = create_test_controller(pool).await;
        let mut tx = controller.tx().await.unwrap();

        let mut repo = Organizations::new(&mut tx);
        let acme = repo.create(&create_request("acme")).await.unwrap();
        let globex = repo.create(&create_request("globex")).await.unwrap();
        repo.create(&create_request("initech")).await.unwrap();

        let page = repo
            .list(Some(&OrganizationFilter {
                name_in: vec!["globex".to_string(), "acme".to_string()],
                ..Default::default()
            }))
            .await
            .unwrap();
        let ids: Vec<_> = page.items.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![acme.id, globex.id]);

        let none = repo
            .list(Some(&OrganizationFilter {
                name_in: vec!["nonexistent".to_string()],
                ..Default::default()
            }))
            .await
            .unwrap();
        assert_eq!(none.pagination.row_count, 0);
        assert!(none.items.is_empty());

        assert_eq!(repo.list(None).await.unwrap().pagination.total_count, 3);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_description(pool: PgPool) {
        let controller = create_test_controller(pool).await;
        let mut tx = controller.tx().await.unwrap();

        let mut repo = Organizations::new(&mut tx);
        let created = repo.create(&create_request("acme")).await.unwrap();
        let updated = repo
            .update(
                created.id,
                &OrganizationUpdateDBRequest {
                    description: Some("Widgets and more".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "acme");
        assert_eq!(updated.description.as_deref(), Some("Widgets and more"));

        let missing = repo.update(created.id + 1000, &OrganizationUpdateDBRequest::default()).await;
        assert!(matches!(missing, Err(DbError::NotFound)));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_cascades_to_categories(pool: PgPool) {
        let controller = create_test_controller(pool).await;
        let mut tx = controller.tx().await.unwrap();

        let org = Organizations::new(&mut tx).create(&create_request("acme")).await.unwrap();
        create_test_category(&mut tx, org.id, "spring").await;

        assert!(Organizations::new(&mut tx).delete(org.id).await.unwrap());

        let remaining = Categories::new(&mut tx)
            .list(Some(&CategoryFilter {
                organization_id_in: vec![org.id],
                ..Default::default()
            }))
            .await
            .unwrap();
        assert_eq!(remaining.pagination.total_count, 0);
        assert!(!Organizations::new(&mut tx).delete(org.id).await.unwrap());
    }
}

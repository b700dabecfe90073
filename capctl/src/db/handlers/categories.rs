//! Database repository for categories.

use crate::db::{
    errors::{DbError, Result},
    filter::{ListFilter, ListQuery, Predicate, Predicates, expect_single, fetch_page},
    handlers::repository::Repository,
    models::categories::{CategoryCreateDBRequest, CategoryDBResponse, CategoryUpdateDBRequest},
    pagination::Paginated,
    settings::{QuerySettings, bounded},
    transaction::TransactionHandler,
};
use crate::types::{CategoryId, CategoryTypeId, Entity, OrganizationId};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};
use tracing::instrument;

/// Filter for listing categories
///
/// Predicates apply in field order: ids, names, types, organizations, active flag.
#[derive(Debug, Clone, Default)]
pub struct CategoryFilter {
    pub ids_in: Vec<CategoryId>,
    pub name_in: Vec<String>,
    pub type_id_in: Vec<CategoryTypeId>,
    pub organization_id_in: Vec<OrganizationId>,
    pub is_active: Option<bool>,
    pub page: Option<i64>,
    pub max_rows: Option<i64>,
}

impl CategoryFilter {
    pub fn with_page(mut self, page: i64, max_rows: i64) -> Self {
        self.page = Some(page);
        self.max_rows = Some(max_rows);
        self
    }
}

impl ListFilter for CategoryFilter {
    fn predicates(&self) -> Vec<Predicate> {
        Predicates::new()
            .any("c.id", &self.ids_in)
            .any("c.name", &self.name_in)
            .any("c.type_id", &self.type_id_in)
            .any("c.organization_id", &self.organization_id_in)
            .eq("c.is_active", self.is_active)
            .finish()
    }

    fn page(&self) -> Option<i64> {
        self.page
    }

    fn max_rows(&self) -> Option<i64> {
        self.max_rows
    }
}

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct Category {
    pub id: CategoryId,
    pub organization_id: OrganizationId,
    pub type_id: CategoryTypeId,
    pub type_name: String,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Category> for CategoryDBResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            organization_id: category.organization_id,
            type_id: category.type_id,
            type_name: category.type_name,
            name: category.name,
            description: category.description,
            is_active: category.is_active,
            created_at: category.created_at,
            updated_at: category.updated_at,
        }
    }
}

struct CategoryList;

impl ListQuery for CategoryList {
    type Row = Category;
    type Filter = CategoryFilter;

    const ENTITY: Entity = Entity::Category;
    const SELECT: &'static str = "SELECT c.id, c.organization_id, c.type_id, ct.name AS type_name, c.name, c.description, \
                                  c.is_active, c.created_at, c.updated_at";
    const FROM: &'static str = "FROM categories c INNER JOIN category_types ct ON ct.id = c.type_id";
    const ORDER_BY: &'static str = "c.id";
}

pub struct Categories<'c> {
    db: &'c mut PgConnection,
    settings: QuerySettings,
}

#[async_trait::async_trait]
impl<'c> Repository for Categories<'c> {
    type CreateRequest = CategoryCreateDBRequest;
    type UpdateRequest = CategoryUpdateDBRequest;
    type Response = CategoryDBResponse;
    type Id = CategoryId;
    type Filter = CategoryFilter;

    #[instrument(skip(self, request), fields(organization_id = request.organization_id, name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let id: CategoryId = bounded(
            self.settings.timeouts.exec,
            "insert category",
            sqlx::query_scalar(
                r#"
                INSERT INTO categories (organization_id, type_id, name, description, is_active)
                VALUES ($1, $2, $3, $4, COALESCE($5, TRUE))
                RETURNING id
                "#,
            )
            .bind(request.organization_id)
            .bind(request.type_id)
            .bind(&request.name)
            .bind(&request.description)
            .bind(request.is_active)
            .fetch_one(&mut *self.db),
        )
        .await?;

        self.get_by_id(id).await.map_err(|e| e.context("create failed"))
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Self::Response> {
        let filter = CategoryFilter {
            ids_in: vec![id],
            ..Default::default()
        };
        expect_single(self.list(Some(&filter)).await?, Entity::Category)
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: Option<&Self::Filter>) -> Result<Paginated<Self::Response>> {
        let default = CategoryFilter::default();
        let filter = filter.unwrap_or(&default);

        let page = fetch_page::<CategoryList>(&mut *self.db, &self.settings, filter).await?;
        Ok(page.map(CategoryDBResponse::from))
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = bounded(
            self.settings.timeouts.exec,
            "delete category",
            sqlx::query("DELETE FROM categories WHERE id = $1").bind(id).execute(&mut *self.db),
        )
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        // Atomic update with conditional field updates
        let result = bounded(
            self.settings.timeouts.exec,
            "update category",
            sqlx::query(
                r#"
                UPDATE categories SET
                    type_id = COALESCE($2, type_id),
                    name = COALESCE($3, name),
                    description = COALESCE($4, description),
                    is_active = COALESCE($5, is_active),
                    updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(id)
            .bind(request.type_id)
            .bind(&request.name)
            .bind(&request.description)
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

impl<'c> Categories<'c> {
    pub fn new<H: TransactionHandler + ?Sized>(handler: &'c mut H) -> Self {
        let settings = *handler.settings();
        Self {
            db: handler.as_executor(),
            settings,
        }
    }

    /// Get the category named `name` inside an organization
    #[instrument(skip(self), err)]
    pub async fn get_by_name(&mut self, organization_id: OrganizationId, name: &str) -> Result<CategoryDBResponse> {
        let filter = CategoryFilter {
            name_in: vec![name.to_string()],
            organization_id_in: vec![organization_id],
            ..Default::default()
        };
        expect_single(self.list(Some(&filter)).await?, Entity::Category)
    }
}

//! Database repository for click trackers.

use crate::db::{
    errors::{DbError, Result},
    filter::{ListFilter, ListQuery, Predicate, Predicates, expect_single, fetch_page},
    handlers::repository::Repository,
    models::click_trackers::{ClickTrackerCreateDBRequest, ClickTrackerDBResponse, ClickTrackerUpdateDBRequest},
    pagination::Paginated,
    settings::{QuerySettings, bounded},
    transaction::TransactionHandler,
};
use crate::types::{CapturePageId, ClickTrackerId, ClickTrackerTypeId, Entity, OrganizationId};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};
use tracing::instrument;

/// Filter for listing click trackers
///
/// `has_capture_page: Some(false)` selects trackers not attached to any page.
#[derive(Debug, Clone, Default)]
pub struct ClickTrackerFilter {
    pub ids_in: Vec<ClickTrackerId>,
    pub name_in: Vec<String>,
    pub type_id_in: Vec<ClickTrackerTypeId>,
    pub organization_id_in: Vec<OrganizationId>,
    pub capture_page_id_in: Vec<CapturePageId>,
    pub has_capture_page: Option<bool>,
    pub is_active: Option<bool>,
    pub page: Option<i64>,
    pub max_rows: Option<i64>,
}

impl ListFilter for ClickTrackerFilter {
    fn predicates(&self) -> Vec<Predicate> {
        Predicates::new()
            .any("t.id", &self.ids_in)
            .any("t.name", &self.name_in)
            .any("t.type_id", &self.type_id_in)
            .any("t.organization_id", &self.organization_id_in)
            .any("t.capture_page_id", &self.capture_page_id_in)
            .is_null("t.capture_page_id", self.has_capture_page.map(|has| !has))
            .eq("t.is_active", self.is_active)
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
struct ClickTracker {
    pub id: ClickTrackerId,
    pub organization_id: OrganizationId,
    pub capture_page_id: Option<CapturePageId>,
    pub type_id: ClickTrackerTypeId,
    pub type_name: String,
    pub name: String,
    pub target_url: String,
    pub click_count: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ClickTracker> for ClickTrackerDBResponse {
    fn from(tracker: ClickTracker) -> Self {
        Self {
            id: tracker.id,
            organization_id: tracker.organization_id,
            capture_page_id: tracker.capture_page_id,
            type_id: tracker.type_id,
            type_name: tracker.type_name,
            name: tracker.name,
            target_url: tracker.target_url,
            click_count: tracker.click_count,
            is_active: tracker.is_active,
            created_at: tracker.created_at,
            updated_at: tracker.updated_at,
        }
    }
}

struct ClickTrackerList;

impl ListQuery for ClickTrackerList {
    type Row = ClickTracker;
    type Filter = ClickTrackerFilter;

    const ENTITY: Entity = Entity::ClickTracker;
    const SELECT: &'static str = "SELECT t.id, t.organization_id, t.capture_page_id, t.type_id, tt.name AS type_name, t.name, \
                                  t.target_url, t.click_count, t.is_active, t.created_at, t.updated_at";
    const FROM: &'static str = "FROM click_trackers t INNER JOIN click_tracker_types tt ON tt.id = t.type_id";
    const ORDER_BY: &'static str = "t.id";
}

pub struct ClickTrackers<'c> {
    db: &'c mut PgConnection,
    settings: QuerySettings,
}

#[async_trait::async_trait]
impl<'c> Repository for ClickTrackers<'c> {
    type CreateRequest = ClickTrackerCreateDBRequest;
    type UpdateRequest = ClickTrackerUpdateDBRequest;
    type Response = ClickTrackerDBResponse;
    type Id = ClickTrackerId;
    type Filter = ClickTrackerFilter;

    #[instrument(skip(self, request), fields(organization_id = request.organization_id, name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let id: ClickTrackerId = bounded(
            self.settings.timeouts.exec,
            "insert click tracker",
            sqlx::query_scalar(
                r#"
                INSERT INTO click_trackers (organization_id, capture_page_id, type_id, name, target_url, is_active)
                VALUES ($1, $2, $3, $4, $5, COALESCE($6, TRUE))
                RETURNING id
                "#,
            )
            .bind(request.organization_id)
            .bind(request.capture_page_id)
            .bind(request.type_id)
            .bind(&request.name)
            .bind(&request.target_url)
            .bind(request.is_active)
            .fetch_one(&mut *self.db),
        )
        .await?;

        self.get_by_id(id).await.map_err(|e| e.context("create failed"))
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Self::Response> {
        let filter = ClickTrackerFilter {
            ids_in: vec![id],
            ..Default::default()
        };
        expect_single(self.list(Some(&filter)).await?, Entity::ClickTracker)
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: Option<&Self::Filter>) -> Result<Paginated<Self::Response>> {
        let default = ClickTrackerFilter::default();
        let filter = filter.unwrap_or(&default);

        let page = fetch_page::<ClickTrackerList>(&mut *self.db, &self.settings, filter).await?;
        Ok(page.map(ClickTrackerDBResponse::from))
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = bounded(
            self.settings.timeouts.exec,
            "delete click tracker",
            sqlx::query("DELETE FROM click_trackers WHERE id = $1").bind(id).execute(&mut *self.db),
        )
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let result = bounded(
            self.settings.timeouts.exec,
            "update click tracker",
            sqlx::query(
                r#"
                UPDATE click_trackers SET
                    capture_page_id = CASE WHEN $2 THEN $3 ELSE capture_page_id END,
                    type_id = COALESCE($4, type_id),
                    name = COALESCE($5, name),
                    target_url = COALESCE($6, target_url),
                    is_active = COALESCE($7, is_active),
                    updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(id)
            .bind(request.capture_page_id.is_some())
            .bind(request.capture_page_id.flatten())
            .bind(request.type_id)
            .bind(&request.name)
            .bind(&request.target_url)
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

impl<'c> ClickTrackers<'c> {
    pub fn new<H: TransactionHandler + ?Sized>(handler: &'c mut H) -> Self {
        let settings = *handler.settings();
        Self {
            db: handler.as_executor(),
            settings,
        }
    }

    /// Get the click tracker named `name` inside an organization
    #[instrument(skip(self), err)]
    pub async fn get_by_name(&mut self, organization_id: OrganizationId, name: &str) -> Result<ClickTrackerDBResponse> {
        let filter = ClickTrackerFilter {
            name_in: vec![name.to_string()],
            organization_id_in: vec![organization_id],
            ..Default::default()
        };
        expect_single(self.list(Some(&filter)).await?, Entity::ClickTracker)
    }

    /// Count one click against an active tracker and return the new total.
    ///
    /// Inactive or missing trackers yield [`DbError::NotFound`].
    #[instrument(skip(self), err)]
    pub async fn record_click(&mut self, id: ClickTrackerId) -> Result<i64> {
        let count: Option<i64> = bounded(
            self.settings.timeouts.exec,
            "record click",
            sqlx::query_scalar(
                r#"
                UPDATE click_trackers
                SET click_count = click_count + 1, updated_at = NOW()
                WHERE id = $1 AND is_active
                RETURNING click_count
                "#,
            )
            .bind(id)
            .fetch_optional(&mut *self.db),
        )
        .await?;

        count.ok_or(DbError::NotFound)
    }
}

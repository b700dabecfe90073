//! Click tracker operations.

use crate::db::handlers::{ClickTrackerFilter, ClickTrackers, Repository};
use crate::db::models::click_trackers::{ClickTrackerCreateDBRequest, ClickTrackerDBResponse, ClickTrackerUpdateDBRequest};
use crate::db::pagination::Paginated;
use crate::db::provider::TransactionProvider;
use crate::errors::{Error, Result};
use crate::services::{finish, missing, require_name};
use crate::types::{ClickTrackerId, Entity};
use tracing::instrument;

#[derive(Clone, Debug)]
pub struct ClickTrackerService {
    provider: TransactionProvider,
}

/// Trackers redirect browsers, so only absolute http(s) targets are accepted.
fn require_target_url(url: &str) -> Result<()> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or_default();
    if rest.is_empty() || rest.starts_with('/') || rest.chars().any(char::is_whitespace) {
        return Err(Error::BadRequest {
            message: format!("target url '{url}' must be an absolute http or https url"),
        });
    }
    Ok(())
}

impl ClickTrackerService {
    pub fn new(provider: TransactionProvider) -> Self {
        Self { provider }
    }

    #[instrument(skip_all, err)]
    pub async fn list(&self, filter: Option<&ClickTrackerFilter>) -> Result<Paginated<ClickTrackerDBResponse>> {
        let mut db = self.provider.db().await?;
        Ok(ClickTrackers::new(&mut *db).list(filter).await?)
    }

    #[instrument(skip(self), err)]
    pub async fn get(&self, id: ClickTrackerId) -> Result<ClickTrackerDBResponse> {
        let mut db = self.provider.db().await?;
        ClickTrackers::new(&mut *db)
            .get_by_id(id)
            .await
            .map_err(|e| missing(e, Entity::ClickTracker, id))
    }

    #[instrument(skip_all, fields(organization_id = request.organization_id), err)]
    pub async fn create(&self, request: &ClickTrackerCreateDBRequest) -> Result<ClickTrackerDBResponse> {
        require_name(&request.name, Entity::ClickTracker)?;
        require_target_url(&request.target_url)?;

        let mut tx = self.provider.tx().await?;
        let outcome = ClickTrackers::new(&mut *tx).create(request).await;
        finish(tx, outcome).await
    }

    #[instrument(skip(self, request), err)]
    pub async fn update(&self, id: ClickTrackerId, request: &ClickTrackerUpdateDBRequest) -> Result<ClickTrackerDBResponse> {
        if let Some(name) = &request.name {
            require_name(name, Entity::ClickTracker)?;
        }
        if let Some(url) = &request.target_url {
            require_target_url(url)?;
        }

        let mut tx = self.provider.tx().await?;
        let outcome = ClickTrackers::new(&mut *tx).update(id, request).await;
        finish(tx, outcome).await.map_err(|e| match e {
            Error::Database(db_err) => missing(db_err, Entity::ClickTracker, id),
            other => other,
        })
    }

    #[instrument(skip(self), err)]
    pub async fn delete(&self, id: ClickTrackerId) -> Result<()> {
        let mut tx = self.provider.tx().await?;
        let outcome = ClickTrackers::new(&mut *tx).delete(id).await;
        if finish(tx, outcome).await? {
            Ok(())
        } else {
            Err(Error::NotFound {
                resource: Entity::ClickTracker,
                id: id.to_string(),
            })
        }
    }

    /// Count a click and return the tracker's new total. Inactive trackers are not found.
    #[instrument(skip(self), err)]
    pub async fn record_click(&self, id: ClickTrackerId) -> Result<i64> {
        let mut tx = self.provider.tx().await?;
        let outcome = ClickTrackers::new(&mut *tx).record_click(id).await;
        finish(tx, outcome).await.map_err(|e| match e {
            Error::Database(db_err) => missing(db_err, Entity::ClickTracker, id),
            other => other,
        })
    }
}

//! Organization operations.

use crate::db::handlers::{OrganizationFilter, Organizations, Repository};
use crate::db::models::organizations::{OrganizationCreateDBRequest, OrganizationDBResponse, OrganizationUpdateDBRequest};
use crate::db::pagination::Paginated;
use crate::db::provider::TransactionProvider;
use crate::errors::{Error, Result};
use crate::services::{finish, missing, require_name};
use crate::types::{Entity, OrganizationId};
use tracing::instrument;

#[derive(Clone, Debug)]
pub struct OrganizationService {
    provider: TransactionProvider,
}

impl OrganizationService {
    pub fn new(provider: TransactionProvider) -> Self {
        Self { provider }
    }

    #[instrument(skip_all, err)]
    pub async fn list(&self, filter: Option<&OrganizationFilter>) -> Result<Paginated<OrganizationDBResponse>> {
        let mut db = self.provider.db().await?;
        Ok(Organizations::new(&mut *db).list(filter).await?)
    }

    #[instrument(skip(self), err)]
    pub async fn get(&self, id: OrganizationId) -> Result<OrganizationDBResponse> {
        let mut db = self.provider.db().await?;
        Organizations::new(&mut *db)
            .get_by_id(id)
            .await
            .map_err(|e| missing(e, Entity::Organization, id))
    }

    #[instrument(skip_all, fields(name = %request.name), err)]
    pub async fn create(&self, request: &OrganizationCreateDBRequest) -> Result<OrganizationDBResponse> {
        require_name(&request.name, Entity::Organization)?;

        let mut tx = self.provider.tx().await?;
        let outcome = Organizations::new(&mut *tx).create(request).await;
        finish(tx, outcome).await
    }

    #[instrument(skip(self, request), err)]
    pub async fn update(&self, id: OrganizationId, request: &OrganizationUpdateDBRequest) -> Result<OrganizationDBResponse> {
        if let Some(name) = &request.name {
            require_name(name, Entity::Organization)?;
        }

        let mut tx = self.provider.tx().await?;
        let outcome = Organizations::new(&mut *tx).update(id, request).await;
        finish(tx, outcome).await.map_err(|e| match e {
            Error::Database(db_err) => missing(db_err, Entity::Organization, id),
            other => other,
        })
    }

    /// Delete an organization together with everything it owns.
    #[instrument(skip(self), err)]
    pub async fn delete(&self, id: OrganizationId) -> Result<()> {
        let mut tx = self.provider.tx().await?;
        let outcome = Organizations::new(&mut *tx).delete(id).await;
        if finish(tx, outcome).await? {
            Ok(())
        } else {
            Err(Error::NotFound {
                resource: Entity::Organization,
                id: id.to_string(),
            })
        }
    }
}

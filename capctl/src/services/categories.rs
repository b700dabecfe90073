//! Category operations.

use crate::db::handlers::{Categories, CategoryFilter, Repository};
use crate::db::models::categories::{CategoryCreateDBRequest, CategoryDBResponse, CategoryUpdateDBRequest};
use crate::db::pagination::Paginated;
use crate::db::provider::TransactionProvider;
use crate::errors::{Error, Result};
use crate::services::{finish, missing, require_name};
use crate::types::{CategoryId, Entity};
use tracing::instrument;

#[derive(Clone, Debug)]
pub struct CategoryService {
    provider: TransactionProvider,
}

impl CategoryService {
    pub fn new(provider: TransactionProvider) -> Self {
        Self { provider }
    }

    #[instrument(skip_all, err)]
    pub async fn list(&self, filter: Option<&CategoryFilter>) -> Result<Paginated<CategoryDBResponse>> {
        let mut db = self.provider.db().await?;
        Ok(Categories::new(&mut *db).list(filter).await?)
    }

    #[instrument(skip(self), err)]
    pub async fn get(&self, id: CategoryId) -> Result<CategoryDBResponse> {
        let mut db = self.provider.db().await?;
        Categories::new(&mut *db)
            .get_by_id(id)
            .await
            .map_err(|e| missing(e, Entity::Category, id))
    }

    #[instrument(skip_all, fields(organization_id = request.organization_id), err)]
    pub async fn create(&self, request: &CategoryCreateDBRequest) -> Result<CategoryDBResponse> {
        require_name(&request.name, Entity::Category)?;

        let mut tx = self.provider.tx().await?;
        let outcome = Categories::new(&mut *tx).create(request).await;
        finish(tx, outcome).await
    }

    #[instrument(skip(self, request), err)]
    pub async fn update(&self, id: CategoryId, request: &CategoryUpdateDBRequest) -> Result<CategoryDBResponse> {
        if let Some(name) = &request.name {
            require_name(name, Entity::Category)?;
        }

        let mut tx = self.provider.tx().await?;
        let outcome = Categories::new(&mut *tx).update(id, request).await;
        finish(tx, outcome).await.map_err(|e| match e {
            Error::Database(db_err) => missing(db_err, Entity::Category, id),
            other => other,
        })
    }

    #[instrument(skip(self), err)]
    pub async fn delete(&self, id: CategoryId) -> Result<()> {
        let mut tx = self.provider.tx().await?;
        let outcome = Categories::new(&mut *tx).delete(id).await;
        if finish(tx, outcome).await? {
            Ok(())
        } else {
            Err(Error::NotFound {
                resource: Entity::Category,
                id: id.to_string(),
            })
        }
    }
}

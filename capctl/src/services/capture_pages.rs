//! Capture page operations.

use crate::db::handlers::{CapturePageFilter, CapturePages, Repository};
use crate::db::models::capture_pages::{CapturePageCreateDBRequest, CapturePageDBResponse, CapturePageUpdateDBRequest};
use crate::db::pagination::Paginated;
use crate::db::provider::TransactionProvider;
use crate::errors::{Error, Result};
use crate::services::{finish, missing, require_name};
use crate::types::{CapturePageId, Entity};
use tracing::instrument;

#[derive(Clone, Debug)]
pub struct CapturePageService {
    provider: TransactionProvider,
}

impl CapturePageService {
    pub fn new(provider: TransactionProvider) -> Self {
        Self { provider }
    }

    #[instrument(skip_all, err)]
    pub async fn list(&self, filter: Option<&CapturePageFilter>) -> Result<Paginated<CapturePageDBResponse>> {
        let mut db = self.provider.db().await?;
        Ok(CapturePages::new(&mut *db).list(filter).await?)
    }

    #[instrument(skip(self), err)]
    pub async fn get(&self, id: CapturePageId) -> Result<CapturePageDBResponse> {
        let mut db = self.provider.db().await?;
        CapturePages::new(&mut *db)
            .get_by_id(id)
            .await
            .map_err(|e| missing(e, Entity::CapturePage, id))
    }

    #[instrument(skip_all, fields(organization_id = request.organization_id), err)]
    pub async fn create(&self, request: &CapturePageCreateDBRequest) -> Result<CapturePageDBResponse> {
        require_name(&request.name, Entity::CapturePage)?;

        let mut tx = self.provider.tx().await?;
        let outcome = CapturePages::new(&mut *tx).create(request).await;
        finish(tx, outcome).await
    }

    #[instrument(skip(self, request), err)]
    pub async fn update(&self, id: CapturePageId, request: &CapturePageUpdateDBRequest) -> Result<CapturePageDBResponse> {
        if let Some(name) = &request.name {
            require_name(name, Entity::CapturePage)?;
        }

        let mut tx = self.provider.tx().await?;
        let outcome = CapturePages::new(&mut *tx).update(id, request).await;
        finish(tx, outcome).await.map_err(|e| match e {
            Error::Database(db_err) => missing(db_err, Entity::CapturePage, id),
            other => other,
        })
    }

    #[instrument(skip(self), err)]
    pub async fn delete(&self, id: CapturePageId) -> Result<()> {
        let mut tx = self.provider.tx().await?;
        let outcome = CapturePages::new(&mut *tx).delete(id).await;
        if finish(tx, outcome).await? {
            Ok(())
        } else {
            Err(Error::NotFound {
                resource: Entity::CapturePage,
                id: id.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::errors::DbError;
    use crate::test_utils::{create_test_organization, create_test_provider};
    use sqlx::PgPool;

    fn create_request(organization_id: i64, category_id: Option<i64>, name: &str) -> CapturePageCreateDBRequest {
        CapturePageCreateDBRequest {
            organization_id,
            category_id,
            type_id: 2,
            name: name.to_string(),
            title: Some("Join the list".to_string()),
            is_active: None,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_lifecycle(pool: PgPool) {
        let provider = create_test_provider(pool).await;
        let org = {
            let mut db = provider.db().await.unwrap();
            create_test_organization(&mut *db, "acme").await
        };
        let service = CapturePageService::new(provider);

        let created = service.create(&create_request(org.id, None, "squeeze")).await.unwrap();
        assert_eq!(created.type_name, "squeeze");

        let updated = service
            .update(
                created.id,
                &CapturePageUpdateDBRequest {
                    title: Some("Last chance".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title.as_deref(), Some("Last chance"));
        assert_eq!(service.get(created.id).await.unwrap(), updated);

        service.delete(created.id).await.unwrap();
        assert!(matches!(service.get(created.id).await, Err(Error::NotFound { .. })));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_unknown_category_rolls_back(pool: PgPool) {
        let provider = create_test_provider(pool.clone()).await;
        let org = {
            let mut db = provider.db().await.unwrap();
            create_test_organization(&mut *db, "acme").await
        };
        let service = CapturePageService::new(provider);

        let result = service.create(&create_request(org.id, Some(9_999), "orphan")).await;
        assert!(matches!(result, Err(Error::Database(DbError::ForeignKeyViolation { .. }))));

        let page = service.list(None).await.unwrap();
        assert_eq!(page.pagination.total_count, 0);
    }
}

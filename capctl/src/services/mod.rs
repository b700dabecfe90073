//! Units of work over the repositories.
//!
//! Each service holds a [`TransactionProvider`](crate::db::provider::TransactionProvider)
//! and spawns one handler per call. Reads run on a handler without a
//! transaction. Writes run inside a transaction that is committed when the
//! repository call succeeds and rolled back otherwise; the repository error is
//! what the caller sees, never the rollback outcome.

pub mod capture_pages;
pub mod categories;
pub mod click_trackers;
pub mod organizations;

pub use capture_pages::CapturePageService;
pub use categories::CategoryService;
pub use click_trackers::ClickTrackerService;
pub use organizations::OrganizationService;

use crate::db::errors::{self, DbError};
use crate::db::transaction::TransactionHandler;
use crate::errors::{Error, Result};
use crate::types::Entity;

/// Commit `handler` if `outcome` succeeded, roll it back otherwise.
pub(crate) async fn finish<T>(handler: Box<dyn TransactionHandler>, outcome: errors::Result<T>) -> Result<T> {
    match outcome {
        Ok(value) => {
            handler.commit().await?;
            Ok(value)
        }
        Err(err) => {
            handler.rollback().await;
            Err(err.into())
        }
    }
}

/// Report a lookup that matched nothing as [`Error::NotFound`] for `resource`.
pub(crate) fn missing(err: DbError, resource: Entity, id: i64) -> Error {
    let absent = matches!(
        err.root(),
        DbError::NotFound | DbError::AmbiguousOrMissingEntry { found: 0, .. }
    );
    if absent {
        Error::NotFound {
            resource,
            id: id.to_string(),
        }
    } else {
        Error::Database(err)
    }
}

/// Reject blank names before they reach the database.
pub(crate) fn require_name(name: &str, resource: Entity) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::BadRequest {
            message: format!("{resource} name must not be empty"),
        });
    }
    Ok(())
}

//! Per-handler query settings and the timeout guard every database call goes through.

use crate::config::{Config, PaginationConfig, QueryTimeouts};
use crate::db::errors::{DbError, Result};
use std::future::Future;
use std::time::Duration;

/// Settings inherited by every handler spawned from a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuerySettings {
    pub timeouts: QueryTimeouts,
    pub pagination: PaginationConfig,
}

impl From<&Config> for QuerySettings {
    fn from(config: &Config) -> Self {
        Self {
            timeouts: config.query_timeouts,
            pagination: config.pagination,
        }
    }
}

impl QuerySettings {
    /// Server-side `statement_timeout` for handlers: the longest client-side limit, so the
    /// server never cancels a statement its caller is still waiting on.
    pub fn statement_timeout(&self) -> Duration {
        self.timeouts.query.max(self.timeouts.exec)
    }
}

/// SQLSTATE `query_canceled`, raised when `statement_timeout` fires
const QUERY_CANCELED: &str = "57014";

/// Run a driver future under `limit`.
///
/// Dropping the future does not stop the statement on the server; handlers set
/// `statement_timeout` for that. A server-side cancellation is reported as the
/// same [`DbError::Timeout`]. Constraint violations keep their categorized
/// [`DbError`] kind; any other driver failure is wrapped with `operation` as
/// context. There is no retry.
pub(crate) async fn bounded<T, F>(limit: Duration, operation: &'static str, fut: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(sqlx::Error::Database(db_err))) if db_err.code().as_deref() == Some(QUERY_CANCELED) => {
            tracing::warn!(operation, ?limit, "database call cancelled by statement timeout");
            Err(DbError::Timeout { operation, after: limit })
        }
        Ok(Err(err)) => Err(match DbError::from(err) {
            DbError::Other(inner) => DbError::Other(inner.context(operation)),
            categorized => categorized,
        }),
        Err(_) => {
            tracing::warn!(operation, ?limit, "database call timed out");
            Err(DbError::Timeout { operation, after: limit })
        }
    }
}

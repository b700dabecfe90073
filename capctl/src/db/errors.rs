use crate::types::Entity;
use std::time::Duration;
use thiserror::Error;

/// Unified error type for database operations that application code can handle
#[derive(Error, Debug)]
pub enum DbError {
    /// Required construction input missing or inconsistent
    #[error("invalid persistence configuration: {message}")]
    Validation { message: String },

    /// `commit` called on a handler that holds no transaction
    #[error("commit invalid for db: handler holds no transaction")]
    CommitOnReadOnly,

    /// A unique lookup matched zero or several rows
    #[error("expected exactly one {entity} entry, found {found}")]
    AmbiguousOrMissingEntry { entity: Entity, found: i64 },

    /// Page or row limit outside the configured bounds
    #[error("invalid pagination: {message}")]
    InvalidPagination { message: String },

    /// The connection pool was closed before a handler could be spawned
    #[error("connection pool is closed")]
    PoolClosed,

    /// A query or statement exceeded its configured timeout
    #[error("{operation} timed out after {after:?}")]
    Timeout { operation: &'static str, after: Duration },

    /// Entity not found by the given identifier
    #[error("Entity not found")]
    NotFound,

    /// Unique constraint violation
    #[error("Unique constraint violation")]
    UniqueViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    /// Foreign key constraint violation
    #[error("Foreign key constraint violation")]
    ForeignKeyViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    /// Check constraint violation
    #[error("Check constraint violation")]
    CheckViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    /// Call-site context around another database error
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<DbError>,
    },

    /// Catch-all for non-recoverable driver errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DbError {
    /// Wrap this error with call-site context, keeping its kind reachable through [`DbError::root`]
    pub fn context(self, context: impl Into<String>) -> Self {
        DbError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with all [`DbError::Context`] layers removed
    pub fn root(&self) -> &DbError {
        match self {
            DbError::Context { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Convert from sqlx::Error using proper sqlx error categorization
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::PoolClosed => DbError::PoolClosed,
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    DbError::UniqueViolation {
                        constraint: db_err.constraint().map(|s| s.to_string()),
                        table: db_err.table().map(|s| s.to_string()),
                        message: db_err.message().to_string(),
                    }
                } else if db_err.is_foreign_key_violation() {
                    DbError::ForeignKeyViolation {
                        constraint: db_err.constraint().map(|s| s.to_string()),
                        table: db_err.table().map(|s| s.to_string()),
                        message: db_err.message().to_string(),
                    }
                } else if db_err.is_check_violation() {
                    DbError::CheckViolation {
                        constraint: db_err.constraint().map(|s| s.to_string()),
                        table: db_err.table().map(|s| s.to_string()),
                        message: db_err.message().to_string(),
                    }
                } else {
                    // All other database errors are non-recoverable - convert to anyhow
                    DbError::Other(anyhow::Error::from(err))
                }
            }
            // All other sqlx errors are non-recoverable - convert to anyhow with context
            _ => DbError::Other(anyhow::Error::from(err)),
        }
    }
}

/// Type alias for database operation results
pub type Result<T> = std::result::Result<T, DbError>;

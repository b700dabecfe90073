use crate::db::errors::DbError;
use crate::types::Entity;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Invalid request data or business rule violation
    #[error("{message}")]
    BadRequest { message: String },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: Entity, id: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::BadRequest { message } => message.clone(),
            Error::NotFound { resource, id } => format!("{resource} with ID {id} not found"),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err.root() {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::AmbiguousOrMissingEntry { entity, found: 0 } => format!("{entity} not found"),
                DbError::AmbiguousOrMissingEntry { entity, .. } => format!("More than one {entity} matches"),
                DbError::InvalidPagination { message } => message.clone(),
                DbError::UniqueViolation { table, .. } => match table.as_deref() {
                    Some("organizations") => "An organization with this name already exists".to_string(),
                    Some("categories") => "A category with this name already exists in the organization".to_string(),
                    Some("capture_pages") => "A capture page with this name already exists in the organization".to_string(),
                    Some("click_trackers") => "A click tracker with this name already exists in the organization".to_string(),
                    _ => "Resource already exists".to_string(),
                },
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::Timeout { .. } => "Database operation timed out".to_string(),
                _ => "Database error occurred".to_string(),
            },
            Error::Other(_) => "Internal server error".to_string(),
        }
    }

    /// Whether the failure was caused by the caller rather than the system
    pub fn is_client_error(&self) -> bool {
        match self {
            Error::BadRequest { .. } | Error::NotFound { .. } => true,
            Error::Database(db_err) => matches!(
                db_err.root(),
                DbError::NotFound
                    | DbError::AmbiguousOrMissingEntry { .. }
                    | DbError::InvalidPagination { .. }
                    | DbError::UniqueViolation { .. }
                    | DbError::ForeignKeyViolation { .. }
                    | DbError::CheckViolation { .. }
            ),
            Error::Internal { .. } | Error::Other(_) => false,
        }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_entry_is_client_error() {
        let err = Error::from(
            DbError::AmbiguousOrMissingEntry {
                entity: Entity::CapturePage,
                found: 0,
            }
            .context("get capture page"),
        );

        assert!(err.is_client_error());
        assert_eq!(err.user_message(), "capture page not found");
    }

    #[test]
    fn test_driver_error_is_not_client_error() {
        let err = Error::from(DbError::Other(anyhow::anyhow!("connection reset")));

        assert!(!err.is_client_error());
        assert_eq!(err.user_message(), "Database error occurred");
    }

    #[test]
    fn test_unique_violation_message_per_table() {
        let err = Error::from(DbError::UniqueViolation {
            constraint: Some("categories_organization_name_unique".to_string()),
            table: Some("categories".to_string()),
            message: "duplicate key".to_string(),
        });

        assert_eq!(err.user_message(), "A category with this name already exists in the organization");
    }
}

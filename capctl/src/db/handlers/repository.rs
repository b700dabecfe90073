//! Base repository trait for database operations.

/// Contains the Repository trait.
///
/// A repository is the data access layer for one postgres table. It provides methods for
/// creating, reading, updating, and deleting entities, as well as listing them one page at a
/// time with sparse filters.
///
/// Repositories are built from a [`TransactionHandler`](crate::db::transaction::TransactionHandler),
/// never from the controller, and run every statement on the handler's executor.
use crate::db::errors::Result;
use crate::db::pagination::Paginated;

/// Base repository trait providing common database operations
///
/// This trait has separate associated types for create requests, update requests, and responses.
#[async_trait::async_trait]
pub trait Repository {
    /// The request type for creating entities
    type CreateRequest;

    /// The request type for updating entities
    type UpdateRequest;

    /// The response/DTO type returned by operations
    type Response;

    /// The identifier type for lookups
    type Id: Send + Sync;

    /// The filter type for list operations
    type Filter: Send + Sync;

    /// Create a new entity
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response>;

    /// Get exactly one entity by ID; zero matches is an error
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Self::Response>;

    /// List one page of entities; `None` behaves like the default filter
    async fn list(&mut self, filter: Option<&Self::Filter>) -> Result<Paginated<Self::Response>>;

    /// Delete an entity by ID
    async fn delete(&mut self, id: Self::Id) -> Result<bool>;

    /// Update an entity by ID
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response>;
}

//! Repository implementations for database access.
//!
//! This module provides one repository struct per table. Repositories follow a
//! consistent pattern and implement the [`Repository`] trait.
//!
//! # Design Pattern
//!
//! Each repository:
//! - Borrows the executor of a [`TransactionHandler`](crate::db::transaction::TransactionHandler)
//! - Inherits the handler's query timeouts and row limits
//! - Lists through the shared filter translator in [`crate::db::filter`]
//! - Returns records from [`crate::db::models`]
//!
//! # Available Repositories
//!
//! - [`Organizations`]: Tenants owning every other record
//! - [`Categories`]: Typed groupings of capture pages
//! - [`CapturePages`]: Lead capture pages, optionally inside a category
//! - [`ClickTrackers`]: Redirect and pixel trackers with click counters
//!
//! # Common Pattern
//!
//! ```ignore
//! use capctl::db::handlers::{Categories, Repository};
//! use capctl::db::transaction::TransactionHandler;
//!
//! async fn example(controller: &TransactionController) -> capctl::db::errors::Result<()> {
//!     let mut tx = controller.tx().await?;
//!
//!     let page = Categories::new(&mut tx).list(None).await?;
//!     println!("{} categories", page.pagination.total_count);
//!
//!     Box::new(tx).commit().await
//! }
//! ```

pub mod capture_pages;
pub mod categories;
pub mod click_trackers;
pub mod organizations;
pub mod repository;

pub use capture_pages::{CapturePageFilter, CapturePages};
pub use categories::{Categories, CategoryFilter};
pub use click_trackers::{ClickTrackerFilter, ClickTrackers};
pub use organizations::{OrganizationFilter, Organizations};
pub use repository::Repository;

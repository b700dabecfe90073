//! Database record models matching table schemas.
//!
//! Each entity has three shapes:
//!
//! - a create request carrying the columns a caller may set on insert
//! - an update request where every `None` field is left untouched
//! - a response with lookup-table names already resolved
//!
//! Row structs that derive `sqlx::FromRow` stay private to their repository in
//! [`crate::db::handlers`] and are converted into the response types here.

pub mod capture_pages;
pub mod categories;
pub mod click_trackers;
pub mod organizations;

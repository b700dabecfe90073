//! Common type definitions.
//!
//! All entity IDs are `BIGSERIAL` keys wrapped in type aliases:
//!
//! - [`OrganizationId`]: Organization identifier
//! - [`CategoryId`]: Category identifier
//! - [`CapturePageId`]: Capture page identifier
//! - [`ClickTrackerId`]: Click tracker identifier
//!
//! Lookup table keys ([`CategoryTypeId`], [`CapturePageTypeId`],
//! [`ClickTrackerTypeId`]) reference rows seeded by the initial migration.

use std::fmt;

// Type aliases for IDs
pub type OrganizationId = i64;
pub type CategoryId = i64;
pub type CapturePageId = i64;
pub type ClickTrackerId = i64;

pub type CategoryTypeId = i64;
pub type CapturePageTypeId = i64;
pub type ClickTrackerTypeId = i64;

/// Entities managed by the persistence layer, used for error messages and log fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Organization,
    Category,
    CapturePage,
    ClickTracker,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Organization => write!(f, "organization"),
            Entity::Category => write!(f, "category"),
            Entity::CapturePage => write!(f, "capture page"),
            Entity::ClickTracker => write!(f, "click tracker"),
        }
    }
}

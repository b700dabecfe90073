use crate::types::{CapturePageId, CapturePageTypeId, CategoryId, OrganizationId};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Database request for creating a new capture page
#[derive(Debug, Clone)]
pub struct CapturePageCreateDBRequest {
    pub organization_id: OrganizationId,
    pub category_id: Option<CategoryId>,
    pub type_id: CapturePageTypeId,
    pub name: String,
    pub title: Option<String>,
    pub is_active: Option<bool>,
}

/// Database request for updating a capture page
///
/// `category_id: Some(None)` detaches the page from its category.
#[derive(Debug, Clone, Default)]
pub struct CapturePageUpdateDBRequest {
    pub category_id: Option<Option<CategoryId>>,
    pub type_id: Option<CapturePageTypeId>,
    pub name: Option<String>,
    pub title: Option<String>,
    pub is_active: Option<bool>,
}

/// Database response for a capture page, with its type name resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapturePageDBResponse {
    pub id: CapturePageId,
    pub organization_id: OrganizationId,
    pub category_id: Option<CategoryId>,
    pub type_id: CapturePageTypeId,
    pub type_name: String,
    pub name: String,
    pub title: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

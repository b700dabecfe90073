use crate::types::{CategoryId, CategoryTypeId, OrganizationId};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Database request for creating a new category
#[derive(Debug, Clone)]
pub struct CategoryCreateDBRequest {
    pub organization_id: OrganizationId,
    pub type_id: CategoryTypeId,
    pub name: String,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

/// Database request for updating a category
#[derive(Debug, Clone, Default)]
pub struct CategoryUpdateDBRequest {
    pub type_id: Option<CategoryTypeId>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

/// Database response for a category, with its type name resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryDBResponse {
    pub id: CategoryId,
    pub organization_id: OrganizationId,
    pub type_id: CategoryTypeId,
    pub type_name: String,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

use crate::types::OrganizationId;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Database request for creating a new organization
#[derive(Debug, Clone)]
pub struct OrganizationCreateDBRequest {
    pub name: String,
    pub description: Option<String>,
}

/// Database request for updating an organization
#[derive(Debug, Clone, Default)]
pub struct OrganizationUpdateDBRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Database response for an organization
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrganizationDBResponse {
    pub id: OrganizationId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

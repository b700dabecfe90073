use crate::types::{CapturePageId, ClickTrackerId, ClickTrackerTypeId, OrganizationId};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Database request for creating a new click tracker
#[derive(Debug, Clone)]
pub struct ClickTrackerCreateDBRequest {
    pub organization_id: OrganizationId,
    pub capture_page_id: Option<CapturePageId>,
    pub type_id: ClickTrackerTypeId,
    pub name: String,
    pub target_url: String,
    pub is_active: Option<bool>,
}

/// Database request for updating a click tracker
///
/// `capture_page_id: Some(None)` detaches the tracker from its capture page.
#[derive(Debug, Clone, Default)]
pub struct ClickTrackerUpdateDBRequest {
    pub capture_page_id: Option<Option<CapturePageId>>,
    pub type_id: Option<ClickTrackerTypeId>,
    pub name: Option<String>,
    pub target_url: Option<String>,
    pub is_active: Option<bool>,
}

/// Database response for a click tracker, with its type name resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClickTrackerDBResponse {
    pub id: ClickTrackerId,
    pub organization_id: OrganizationId,
    pub capture_page_id: Option<CapturePageId>,
    pub type_id: ClickTrackerTypeId,
    pub type_name: String,
    pub name: String,
    pub target_url: String,
    pub click_count: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//! Rental application domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Withdrawn => "withdrawn",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalApplication {
    pub id: Uuid,
    pub property_id: Uuid,
    pub tenant_id: Uuid,
    pub status: ApplicationStatus,
    pub move_in_date: Option<DateTime<Utc>>,
    pub message: Option<String>,
    /// Supporting documents as supplied by the applicant.
    pub documents: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApplication {
    pub property_id: Uuid,
    pub tenant_id: Uuid,
    pub move_in_date: Option<DateTime<Utc>>,
    pub message: Option<String>,
    pub documents: Option<serde_json::Value>,
}

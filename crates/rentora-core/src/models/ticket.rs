//! Support ticket domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
    Escalated,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
            Self::Escalated => "escalated",
        }
    }

    /// All statuses, for the configuration listing endpoint.
    pub fn all() -> &'static [TicketStatus] {
        &[
            Self::Open,
            Self::InProgress,
            Self::Resolved,
            Self::Closed,
            Self::Escalated,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl TicketPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    /// Response-time SLA in hours for this priority.
    pub fn sla_hours(&self) -> i64 {
        match self {
            Self::Urgent => 4,
            Self::High => 24,
            Self::Medium => 48,
            Self::Low => 72,
        }
    }

    pub fn all() -> &'static [TicketPriority] {
        &[Self::Low, Self::Medium, Self::High, Self::Urgent]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: Uuid,
    /// Human-facing sequential number, `TKT-001` style.
    pub ticket_number: String,
    pub subject: String,
    pub description: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub category: String,
    pub customer_email: String,
    pub customer_name: String,
    pub assigned_to: Option<String>,
    pub tags: Vec<String>,
    /// Due date derived from priority at creation / priority change.
    pub sla_due_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicket {
    pub subject: String,
    pub description: String,
    pub priority: TicketPriority,
    pub category: String,
    pub customer_email: String,
    pub customer_name: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTicket {
    pub subject: Option<String>,
    pub description: Option<String>,
    pub status: Option<TicketStatus>,
    /// A priority change recomputes the SLA due date.
    pub priority: Option<TicketPriority>,
    pub category: Option<String>,
    pub assigned_to: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketMessage {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub author: String,
    pub body: String,
    /// Internal notes are not shown to the customer.
    pub internal: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketMessage {
    pub ticket_id: Uuid,
    pub author: String,
    pub body: String,
    pub internal: bool,
}

/// Filter set for the ticket listing endpoint.
#[derive(Debug, Clone, Default)]
pub struct TicketFilters {
    pub status: Vec<TicketStatus>,
    pub priority: Vec<TicketPriority>,
    pub category: Option<String>,
    /// Case-insensitive substring match over subject and description.
    pub search: Option<String>,
}

/// Aggregated counts for the support dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketStatistics {
    pub total: u64,
    pub open: u64,
    pub in_progress: u64,
    pub resolved: u64,
    pub closed: u64,
    pub escalated: u64,
    pub by_priority: Vec<PriorityCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityCount {
    pub priority: TicketPriority,
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sla_hours_follow_priority() {
        assert_eq!(TicketPriority::Urgent.sla_hours(), 4);
        assert_eq!(TicketPriority::High.sla_hours(), 24);
        assert_eq!(TicketPriority::Medium.sla_hours(), 48);
        assert_eq!(TicketPriority::Low.sla_hours(), 72);
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&TicketStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }
}

//! Service-provider marketplace models: ads, bids, catalogues.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Upload caps enforced at ad creation.
pub const MAX_AD_IMAGES: usize = 3;
pub const MAX_AD_DOCUMENTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdStatus {
    Open,
    Closed,
}

impl AdStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAd {
    pub id: Uuid,
    pub title: String,
    pub owner_id: Option<Uuid>,
    pub owner_name: String,
    pub description: String,
    pub category: String,
    pub location: serde_json::Value,
    pub price: i64,
    pub images: Vec<String>,
    pub documents: Vec<String>,
    pub status: AdStatus,
    /// Denormalized count, incremented when a bid is placed.
    pub bid_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceAd {
    pub title: String,
    pub owner_id: Option<Uuid>,
    pub owner_name: String,
    pub description: String,
    pub category: String,
    pub location: serde_json::Value,
    pub price: i64,
    pub images: Vec<String>,
    pub documents: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceAd {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub location: Option<serde_json::Value>,
    pub price: Option<i64>,
    pub images: Option<Vec<String>>,
    pub documents: Option<Vec<String>>,
    pub status: Option<AdStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BidStatus {
    Placed,
    Accepted,
    Rejected,
}

impl BidStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Placed => "placed",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdBid {
    pub id: Uuid,
    pub ad_id: Uuid,
    pub bidder_id: Uuid,
    pub bidder_name: String,
    pub amount: i64,
    pub message: Option<String>,
    pub status: BidStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdBid {
    pub ad_id: Uuid,
    pub bidder_id: Uuid,
    pub bidder_name: String,
    pub amount: i64,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAdBid {
    pub amount: Option<i64>,
    pub message: Option<Option<String>>,
    pub status: Option<BidStatus>,
}

/// Per-provider service catalogue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalogue {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub services: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

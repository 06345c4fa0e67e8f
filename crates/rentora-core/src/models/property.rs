//! Property listing domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyStatus {
    Available,
    Rented,
    Archived,
}

impl PropertyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Rented => "rented",
            Self::Archived => "archived",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// Monthly (or per-period) price in minor currency units.
    pub price: i64,
    pub currency: String,
    pub property_type: String,
    pub rental_type: String,
    pub rental_period: String,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub area: Option<f64>,
    /// Free-form location object; `city` is the filterable key.
    pub location: serde_json::Value,
    pub amenities: Vec<String>,
    pub images: Vec<String>,
    pub landlord_id: Uuid,
    pub available_date: Option<DateTime<Utc>>,
    pub status: PropertyStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Property {
    /// City component of the location object, if present.
    pub fn city(&self) -> Option<&str> {
        self.location.get("city").and_then(|v| v.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProperty {
    pub title: String,
    pub description: Option<String>,
    pub price: i64,
    pub currency: Option<String>,
    pub property_type: String,
    pub rental_type: String,
    pub rental_period: Option<String>,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub area: Option<f64>,
    pub location: serde_json::Value,
    pub amenities: Vec<String>,
    pub images: Vec<String>,
    pub landlord_id: Uuid,
    pub available_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProperty {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub price: Option<i64>,
    pub currency: Option<String>,
    pub property_type: Option<String>,
    pub rental_type: Option<String>,
    pub rental_period: Option<String>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub area: Option<Option<f64>>,
    pub location: Option<serde_json::Value>,
    pub amenities: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
    pub available_date: Option<Option<DateTime<Utc>>>,
    pub status: Option<PropertyStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertySort {
    Price,
    Date,
    Location,
}

/// Filter set for property listing and search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyFilters {
    pub city: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub property_type: Option<String>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub rental_type: Option<String>,
    pub amenities: Vec<String>,
    pub sort_by: Option<PropertySort>,
    pub sort_order: Option<SortOrder>,
}

//! Route modules, one per resource.

pub mod admin;
pub mod ads;
pub mod applications;
pub mod auth;
pub mod mobile;
pub mod properties;
pub mod settings;
pub mod tickets;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use chrono::{DateTime, Utc};
use rentora_core::models::user::{User, UserRole};
use rentora_core::repository::Pagination;
use serde::Serialize;
use uuid::Uuid;

use crate::error::ApiError;

/// Unwrap a JSON body, mapping parse/shape failures to the
/// `VALIDATION_ERROR` envelope instead of axum's default rejection.
pub(crate) fn validated_json<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(ApiError::Validation(rejection.body_text())),
    }
}

/// Clamp page/limit query values into a [`Pagination`]. Page starts at
/// 1; the limit is capped at 50.
pub(crate) fn page_params(page: Option<u64>, limit: Option<u64>) -> (Pagination, u64, u64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(20).clamp(1, 50);
    (
        Pagination {
            offset: (page - 1) * limit,
            limit,
        },
        page,
        limit,
    )
}

/// Pagination block appended to list responses.
#[derive(Debug, Serialize)]
pub(crate) struct PageInfo {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    #[serde(rename = "totalPages")]
    pub total_pages: u64,
}

impl PageInfo {
    pub fn new(page: u64, limit: u64, total: u64) -> Self {
        Self {
            page,
            limit,
            total,
            total_pages: total.div_ceil(limit),
        }
    }
}

/// Wire shape of a user record in auth responses.
#[derive(Debug, Serialize)]
pub(crate) struct UserPayload {
    pub id: Uuid,
    /// External-provider subject id.
    pub uid: Option<String>,
    pub email: String,
    pub name: String,
    pub surname: String,
    pub role: UserRole,
    pub twofa_enabled: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserPayload {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            uid: user.subject_id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            surname: user.surname.clone(),
            role: user.role,
            twofa_enabled: user.two_factor_enabled,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

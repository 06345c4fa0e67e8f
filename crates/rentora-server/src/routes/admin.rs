//! Admin routes: dashboard, analytics, profile, OTP-gated deletion,
//! and two-factor enrollment.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::handler::Handler;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::{DateTime, Duration, Utc};
use rentora_core::models::user::UserRole;
use rentora_core::repository::{ApplicationRepository, PropertyRepository, UserRepository};
use serde::Deserialize;
use serde_json::json;
use surrealdb::Connection;

use super::{UserPayload, validated_json};
use crate::error::ApiError;
use crate::gate::{CurrentUser, federated_auth, require_otp, require_role, success};
use crate::state::AppState;

pub fn router<C: Connection>(state: AppState<C>) -> Router {
    let protected = Router::new()
        .route("/dashboard", get(dashboard::<C>))
        .route("/properties/analytics", get(property_analytics::<C>))
        .route("/admin-profile", get(admin_profile))
        .route(
            "/delete-admin",
            delete(
                delete_admin::<C>.layer(from_fn_with_state(state.clone(), require_otp::<C>)),
            ),
        )
        .route_layer(from_fn(require_role(&[UserRole::Admin])))
        .route_layer(from_fn_with_state(state.clone(), federated_auth::<C>));

    // Two-factor enrollment endpoints are reachable without a session;
    // they operate on the account named in the body.
    let enrollment = Router::new()
        .route("/init-2fa", post(init_two_factor::<C>))
        .route("/enable-2fa", post(enable_two_factor::<C>))
        .route("/verify-otp", post(verify_otp::<C>));

    protected.merge(enrollment).with_state(state)
}

/// GET /api/admin/dashboard — marketplace-wide counters.
async fn dashboard<C: Connection>(
    State(state): State<AppState<C>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let total_properties = state.properties.count().await?;
    let total_users = state.users.count().await?;
    let total_applications = state.applications.count().await?;
    let pending_applications = state.applications.count_pending().await?;

    Ok(success(json!({
        "stats": {
            "totalProperties": total_properties,
            "totalUsers": total_users,
            "totalApplications": total_applications,
            "pendingApplications": pending_applications,
            "revenue": { "monthly": 0, "currency": "ZAR" },
        },
    })))
}

#[derive(Debug, Deserialize)]
struct AnalyticsQuery {
    period: Option<String>,
}

fn since_for_period(period: &str) -> DateTime<Utc> {
    let now = Utc::now();
    match period {
        "7d" => now - Duration::days(7),
        "90d" => now - Duration::days(90),
        "1y" => now - Duration::days(365),
        _ => now - Duration::days(30),
    }
}

/// GET /api/admin/properties/analytics?period=7d|30d|90d|1y
async fn property_analytics<C: Connection>(
    State(state): State<AppState<C>>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let since = since_for_period(query.period.as_deref().unwrap_or("30d"));

    let applications = state.applications.count_since(since).await?;
    let properties = state.properties.count_since(since).await?;
    let locations = state.properties.locations_since(since).await?;

    // Top cities by listing volume within the period.
    let mut city_counts: std::collections::HashMap<String, u64> = std::collections::HashMap::new();
    for location in locations {
        let city = location
            .get("city")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown")
            .to_string();
        *city_counts.entry(city).or_insert(0) += 1;
    }
    let mut top_locations: Vec<(String, u64)> = city_counts.into_iter().collect();
    top_locations.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top_locations.truncate(10);
    let top_locations: Vec<serde_json::Value> = top_locations
        .into_iter()
        .map(|(city, count)| json!({ "city": city, "count": count }))
        .collect();

    // Applications per property, as a one-decimal percentage.
    let conversion_rate = if properties > 0 {
        (applications as f64 / properties as f64 * 1000.0).round() / 10.0
    } else {
        0.0
    };

    Ok(success(json!({
        "analytics": {
            "views": 0,
            "applications": applications,
            "conversionRate": conversion_rate,
            "topLocations": top_locations,
        },
    })))
}

/// GET /api/admin/admin-profile
async fn admin_profile(
    CurrentUser(user): CurrentUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(success(json!({ "admin": UserPayload::from(&user) })))
}

/// DELETE /api/admin/delete-admin — removes the calling admin's
/// account. Requires a valid OTP in the body (enforced by the gate).
async fn delete_admin<C: Connection>(
    State(state): State<AppState<C>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.users.delete(user.id).await?;

    Ok(success(json!({
        "msg": "Admin deleted",
        "admin": { "id": user.id },
    })))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct InitTwoFactorRequest {
    email: String,
}

/// POST /api/admin/init-2fa — generate a secret and QR code. Nothing
/// is persisted until the secret is confirmed via enable.
async fn init_two_factor<C: Connection>(
    State(state): State<AppState<C>>,
    body: Result<Json<InitTwoFactorRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let req = validated_json(body)?;

    if req.email.trim().is_empty() {
        return Err(ApiError::Validation("email is required".into()));
    }

    let enrollment = state.auth.init_two_factor(&req.email)?;

    Ok(success(json!({
        "secret": enrollment.secret,
        "qrCodeBase64": enrollment.qr_png_base64,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EnableTwoFactorRequest {
    email: String,
    secret_key: String,
}

/// POST /api/admin/enable-2fa — persist the confirmed secret.
async fn enable_two_factor<C: Connection>(
    State(state): State<AppState<C>>,
    body: Result<Json<EnableTwoFactorRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let req = validated_json(body)?;

    if req.email.trim().is_empty() || req.secret_key.trim().is_empty() {
        return Err(ApiError::Validation(
            "email and secret_key are required".into(),
        ));
    }

    state
        .auth
        .enable_two_factor(&req.email, &req.secret_key)
        .await?;

    Ok(success(json!({ "message": "2FA enabled successfully" })))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VerifyOtpRequest {
    email: String,
    token: String,
}

/// POST /api/admin/verify-otp — check a code against the stored
/// secret.
async fn verify_otp<C: Connection>(
    State(state): State<AppState<C>>,
    body: Result<Json<VerifyOtpRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let req = validated_json(body)?;

    if req.email.trim().is_empty() || req.token.trim().is_empty() {
        return Err(ApiError::Validation("email and token are required".into()));
    }

    let valid = state.auth.verify_two_factor(&req.email, &req.token).await?;
    if !valid {
        return Err(ApiError::InvalidToken(
            "the provided OTP is invalid or has expired".into(),
        ));
    }

    Ok(success(json!({ "message": "OTP verified successfully" })))
}

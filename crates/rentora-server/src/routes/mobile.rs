//! Password-based registration and login.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::post;
use axum::{Json, Router};
use rentora_auth::service::RegisterInput;
use rentora_core::models::user::UserRole;
use serde::Deserialize;
use serde_json::json;
use surrealdb::Connection;

use super::{UserPayload, validated_json};
use crate::error::ApiError;
use crate::gate::success;
use crate::state::AppState;

pub fn router<C: Connection>(state: AppState<C>) -> Router {
    Router::new()
        .route("/register-user", post(register_user::<C>))
        .route("/login", post(login::<C>))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RegisterRequest {
    name: String,
    surname: String,
    email: String,
    #[serde(rename = "phoneNumber")]
    phone_number: String,
    #[serde(rename = "userType")]
    user_type: UserRole,
    password: String,
    /// Accepted for wire compatibility; location records are out of
    /// scope for the auth path.
    #[allow(dead_code)]
    location: Option<serde_json::Value>,
}

/// POST /api/mobile/register-user — create a password-based account.
async fn register_user<C: Connection>(
    State(state): State<AppState<C>>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let req = validated_json(body)?;

    for (field, value) in [
        ("name", &req.name),
        ("email", &req.email),
        ("phoneNumber", &req.phone_number),
        ("password", &req.password),
    ] {
        if value.trim().is_empty() {
            return Err(ApiError::Validation(format!("{field} is required")));
        }
    }

    let out = state
        .auth
        .register(RegisterInput {
            name: req.name,
            surname: req.surname,
            email: req.email,
            phone: Some(req.phone_number),
            role: req.user_type,
            password: req.password,
        })
        .await?;

    Ok(success(json!({
        "message": "User registered successfully",
        "userId": out.user.id,
        "token": out.token,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LoginRequest {
    email: String,
    password: String,
}

/// POST /api/mobile/login — email + password, returns user and token.
async fn login<C: Connection>(
    State(state): State<AppState<C>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let req = validated_json(body)?;

    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::Validation("email and password are required".into()));
    }

    let out = state.auth.login(&req.email, &req.password).await?;

    Ok(success(json!({
        "message": "Login successful",
        "token": out.token,
        "user": UserPayload::from(&out.user),
    })))
}

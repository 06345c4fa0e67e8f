//! Federated authentication routes: identity sync and token exchange.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::request::Parts;
use axum::routing::{get, post};
use axum::{Json, Router};
use rentora_core::models::user::RegistrationType;
use serde::Deserialize;
use serde_json::json;
use surrealdb::Connection;

use super::{UserPayload, validated_json};
use crate::error::ApiError;
use crate::gate::{bearer_token, success};
use crate::state::AppState;

pub fn router<C: Connection>(state: AppState<C>) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/sync", post(sync::<C>))
        .route("/firebase", post(firebase::<C>))
        .with_state(state)
}

/// GET /api/auth — surface listing.
async fn health() -> Json<serde_json::Value> {
    success(json!({
        "service": "auth",
        "endpoints": ["POST /api/auth/sync", "POST /api/auth/firebase"],
    }))
}

/// POST /api/auth/sync — verify the bearer external token, sync the
/// user into local storage, and return the user plus a session token.
async fn sync<C: Connection>(
    State(state): State<AppState<C>>,
    parts: Parts,
) -> Result<Json<serde_json::Value>, ApiError> {
    let token = bearer_token(&parts)?;

    let out = state
        .auth
        .sync_identity(token, RegistrationType::Google)
        .await?;

    Ok(success(json!({
        "user": UserPayload::from(&out.user),
        "token": out.token,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FirebaseAuthRequest {
    #[serde(rename = "idToken")]
    id_token: String,
    #[serde(rename = "registrationType")]
    registration_type: RegistrationType,
}

/// POST /api/auth/firebase — body-supplied external token with an
/// explicit registration type; same response shape as `/sync`.
async fn firebase<C: Connection>(
    State(state): State<AppState<C>>,
    body: Result<Json<FirebaseAuthRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let req = validated_json(body)?;

    if req.id_token.trim().is_empty() {
        return Err(ApiError::Validation("idToken must not be empty".into()));
    }

    let out = state
        .auth
        .sync_identity(&req.id_token, req.registration_type)
        .await?;

    Ok(success(json!({
        "user": UserPayload::from(&out.user),
        "token": out.token,
    })))
}

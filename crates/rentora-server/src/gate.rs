//! Request gates: authentication, identity sync, role checks, and the
//! OTP gate.
//!
//! Gates compose as middleware layers in a fixed order per route:
//! authenticate → sync identity → authorize role → (optionally)
//! require OTP → handler. Each gate fails fast; no state is mutated
//! past a failing gate.

use std::future::Future;
use std::pin::Pin;

use axum::Json;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use rentora_core::models::user::{User, UserRole};
use serde::Deserialize;
use surrealdb::Connection;

use crate::error::ApiError;
use crate::state::AppState;

/// Maximum body size the OTP gate will buffer.
const OTP_BODY_LIMIT: usize = 64 * 1024;

/// Extension holding the authenticated user for downstream gates and
/// handlers.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl<S: Send + Sync> axum::extract::FromRequestParts<S> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<CurrentUser>().cloned().ok_or_else(|| {
            ApiError::AuthenticationRequired("user not found on request context".into())
        })
    }
}

/// Extract the token from a `Bearer <token>` Authorization header.
///
/// Fails with `AUTHENTICATION_REQUIRED` when the header is missing or
/// malformed; no downstream calls are made in that case.
pub fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            ApiError::AuthenticationRequired("please provide a valid Bearer token".into())
        })
}

/// Authentication gate for federated tokens: verify the external ID
/// token, sync the identity into local storage, and attach the local
/// user to the request.
pub async fn federated_auth<C: Connection>(
    State(state): State<AppState<C>>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();

    let token = match bearer_token(&parts) {
        Ok(token) => token.to_string(),
        Err(err) => return err.into_response(),
    };

    match state.auth.authenticate_external(&token).await {
        Ok(user) => {
            parts.extensions.insert(CurrentUser(user));
            next.run(Request::from_parts(parts, body)).await
        }
        Err(err) => ApiError::from(err).into_response(),
    }
}

/// Authentication gate for locally issued session tokens.
pub async fn session_auth<C: Connection>(
    State(state): State<AppState<C>>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();

    let token = match bearer_token(&parts) {
        Ok(token) => token.to_string(),
        Err(err) => return err.into_response(),
    };

    match state.auth.authenticate_session(&token).await {
        Ok(user) => {
            parts.extensions.insert(CurrentUser(user));
            next.run(Request::from_parts(parts, body)).await
        }
        Err(err) => ApiError::from(err).into_response(),
    }
}

/// Role gate factory: rejects with `INSUFFICIENT_PERMISSIONS` unless
/// the authenticated user's role is in the allowed set. Must run after
/// an authentication gate.
pub fn require_role(
    allowed: &'static [UserRole],
) -> impl Fn(Request, Next) -> Pin<Box<dyn Future<Output = Response> + Send>> + Clone {
    move |request: Request, next: Next| {
        Box::pin(async move {
            let Some(CurrentUser(user)) = request.extensions().get::<CurrentUser>().cloned()
            else {
                return ApiError::AuthenticationRequired("user not found on request".into())
                    .into_response();
            };

            if !allowed.contains(&user.role) {
                let roles = allowed
                    .iter()
                    .map(|r| r.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                return ApiError::InsufficientPermissions(format!("required role: one of {roles}"))
                    .into_response();
            }

            next.run(request).await
        })
    }
}

#[derive(Debug, Deserialize)]
struct OtpBody {
    otp: Option<String>,
}

/// OTP gate: requires a valid body-supplied one-time code for
/// high-security actions. Must run after an authentication gate.
///
/// The body is buffered to peek at the `otp` field, then restored for
/// the downstream handler.
pub async fn require_otp<C: Connection>(
    State(state): State<AppState<C>>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();

    let bytes = match axum::body::to_bytes(body, OTP_BODY_LIMIT).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return ApiError::Validation("unreadable request body".into()).into_response();
        }
    };

    let otp = serde_json::from_slice::<OtpBody>(&bytes)
        .ok()
        .and_then(|b| b.otp);

    let Some(otp) = otp else {
        return ApiError::Validation("provide 'otp' in request body for this action".into())
            .into_response();
    };

    let Some(CurrentUser(user)) = parts.extensions.get::<CurrentUser>().cloned() else {
        return ApiError::AuthenticationRequired("user not found on request".into())
            .into_response();
    };

    if !user.two_factor_enabled || user.two_factor_secret.is_none() {
        return ApiError::InsufficientPermissions(
            "two-factor authentication must be enabled for this action".into(),
        )
        .into_response();
    }

    match state.auth.verify_code_for(&user, &otp) {
        Ok(true) => {}
        Ok(false) => {
            return ApiError::InvalidToken("the provided OTP is invalid or has expired".into())
                .into_response();
        }
        Err(err) => return ApiError::from(err).into_response(),
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

/// Success envelope helper: `{"success": true, ...payload}`.
pub fn success(payload: serde_json::Value) -> Json<serde_json::Value> {
    let mut body = serde_json::Map::new();
    body.insert("success".into(), serde_json::Value::Bool(true));
    if let serde_json::Value::Object(map) = payload {
        body.extend(map);
    }
    Json(serde_json::Value::Object(body))
}

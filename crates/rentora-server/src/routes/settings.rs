//! Application and SMTP settings routes. Admin-gated.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::{Json, Router};
use rentora_auth::secrets;
use rentora_core::models::settings::{
    CreateAppSettings, SmtpConfig, UpdateAppSettings, UpdateSmtpConfig,
};
use rentora_core::models::user::UserRole;
use rentora_core::repository::SettingsRepository;
use serde::{Deserialize, Serialize};
use serde_json::json;
use surrealdb::Connection;

use super::validated_json;
use crate::error::ApiError;
use crate::gate::{federated_auth, require_role, success};
use crate::mail;
use crate::state::AppState;

pub fn router<C: Connection>(state: AppState<C>) -> Router {
    Router::new()
        .route(
            "/app",
            get(get_app_settings::<C>)
                .post(save_app_settings::<C>)
                .put(update_app_settings::<C>),
        )
        .route(
            "/smtp",
            get(get_smtp::<C>).post(save_smtp::<C>).put(update_smtp::<C>),
        )
        .route("/smtp/test", post(test_smtp::<C>))
        .route_layer(from_fn(require_role(&[UserRole::Admin])))
        .route_layer(from_fn_with_state(state.clone(), federated_auth::<C>))
        .with_state(state)
}

/// GET /api/settings/app
async fn get_app_settings<C: Connection>(
    State(state): State<AppState<C>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let settings = state.settings.get_latest().await?;
    Ok(success(json!({ "settings": settings })))
}

/// POST /api/settings/app
async fn save_app_settings<C: Connection>(
    State(state): State<AppState<C>>,
    body: Result<Json<CreateAppSettings>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let req = validated_json(body)?;

    if req.app_name.trim().is_empty() {
        return Err(ApiError::Validation("app_name is required".into()));
    }

    let settings = state.settings.save(req).await?;
    Ok(success(json!({ "settings": settings })))
}

/// PUT /api/settings/app
async fn update_app_settings<C: Connection>(
    State(state): State<AppState<C>>,
    body: Result<Json<UpdateAppSettings>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let req = validated_json(body)?;

    let settings = state
        .settings
        .update(req)
        .await?
        .ok_or_else(|| ApiError::NotFound("no settings saved yet".into()))?;

    Ok(success(json!({ "settings": settings })))
}

/// SMTP config as returned to clients: the password never leaves the
/// server, only a flag indicating one is stored.
#[derive(Debug, Serialize)]
struct SmtpPayload {
    host: String,
    port: u16,
    username: String,
    encryption: String,
    #[serde(rename = "fromEmail")]
    from_email: String,
    #[serde(rename = "fromName")]
    from_name: String,
    active: bool,
    #[serde(rename = "hasPassword")]
    has_password: bool,
}

impl From<SmtpConfig> for SmtpPayload {
    fn from(config: SmtpConfig) -> Self {
        Self {
            host: config.host,
            port: config.port,
            username: config.username,
            encryption: config.encryption,
            from_email: config.from_email,
            from_name: config.from_name,
            active: config.active,
            has_password: !config.password_enc.is_empty(),
        }
    }
}

/// GET /api/settings/smtp
async fn get_smtp<C: Connection>(
    State(state): State<AppState<C>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let smtp = state.settings.get_smtp().await?.map(SmtpPayload::from);
    Ok(success(json!({ "smtp": smtp })))
}

fn encryption_key<C: Connection>(state: &AppState<C>) -> Result<[u8; 32], ApiError> {
    state
        .auth
        .config()
        .secret_encryption_key
        .ok_or_else(|| ApiError::Internal("secret encryption key is not configured".into()))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SaveSmtpRequest {
    host: String,
    port: u16,
    username: String,
    password: String,
    encryption: Option<String>,
    #[serde(rename = "fromEmail")]
    from_email: String,
    #[serde(rename = "fromName")]
    from_name: String,
    active: Option<bool>,
}

/// POST /api/settings/smtp — store the full SMTP configuration; the
/// password is encrypted before it reaches storage.
async fn save_smtp<C: Connection>(
    State(state): State<AppState<C>>,
    body: Result<Json<SaveSmtpRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let req = validated_json(body)?;

    if req.host.trim().is_empty() {
        return Err(ApiError::Validation("host is required".into()));
    }
    let encryption = req.encryption.unwrap_or_else(|| "tls".into());
    if !["tls", "ssl", "none"].contains(&encryption.as_str()) {
        return Err(ApiError::Validation(
            "encryption must be one of tls, ssl, none".into(),
        ));
    }

    let key = encryption_key(&state)?;
    let password_enc = secrets::encrypt_secret(&key, req.password.as_bytes())
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let smtp = state
        .settings
        .save_smtp(SmtpConfig {
            host: req.host,
            port: req.port,
            username: req.username,
            password_enc,
            encryption,
            from_email: req.from_email,
            from_name: req.from_name,
            active: req.active.unwrap_or(false),
        })
        .await?;

    Ok(success(json!({ "smtp": SmtpPayload::from(smtp) })))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UpdateSmtpRequest {
    host: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    password: Option<String>,
    encryption: Option<String>,
    #[serde(rename = "fromEmail")]
    from_email: Option<String>,
    #[serde(rename = "fromName")]
    from_name: Option<String>,
    active: Option<bool>,
}

/// PUT /api/settings/smtp — partial update.
async fn update_smtp<C: Connection>(
    State(state): State<AppState<C>>,
    body: Result<Json<UpdateSmtpRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let req = validated_json(body)?;

    let password_enc = match req.password {
        Some(password) => {
            let key = encryption_key(&state)?;
            Some(
                secrets::encrypt_secret(&key, password.as_bytes())
                    .map_err(|e| ApiError::Internal(e.to_string()))?,
            )
        }
        None => None,
    };

    let smtp = state
        .settings
        .update_smtp(UpdateSmtpConfig {
            host: req.host,
            port: req.port,
            username: req.username,
            password_enc,
            encryption: req.encryption,
            from_email: req.from_email,
            from_name: req.from_name,
            active: req.active,
        })
        .await?
        .ok_or_else(|| ApiError::NotFound("no settings saved yet".into()))?;

    Ok(success(json!({ "smtp": SmtpPayload::from(smtp) })))
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TestSmtpRequest {
    host: Option<String>,
    port: Option<u16>,
}

/// POST /api/settings/smtp/test — reachability check against the
/// stored (or overridden) host and port.
async fn test_smtp<C: Connection>(
    State(state): State<AppState<C>>,
    body: Result<Json<TestSmtpRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let req = body.map(|Json(v)| v).unwrap_or_default();

    let stored = state.settings.get_smtp().await?;
    let host = req
        .host
        .or_else(|| stored.as_ref().map(|s| s.host.clone()))
        .filter(|h| !h.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("no SMTP host configured".into()))?;
    let port = req.port.or_else(|| stored.map(|s| s.port)).unwrap_or(587);

    let greeting = mail::test_connection(&host, port).await?;

    Ok(success(json!({
        "message": "SMTP connection established",
        "greeting": greeting,
    })))
}

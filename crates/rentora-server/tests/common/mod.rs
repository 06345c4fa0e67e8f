//! Shared test harness: in-memory database, static identity provider,
//! request builders.
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use http_body_util::BodyExt;
use rentora_auth::AuthConfig;
use rentora_auth::identity::{StaticIdentityProvider, VerifiedIdentity};
use rentora_server::AppState;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

pub const JWT_SECRET: &str = "integration-test-secret";

/// Tokens the static identity provider accepts.
pub const ALICE_TOKEN: &str = "alice-external-token";
pub const ADMIN_TOKEN: &str = "admin-external-token";

pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: JWT_SECRET.into(),
        secret_encryption_key: Some([7u8; 32]),
        ..AuthConfig::default()
    }
}

fn provider() -> Arc<StaticIdentityProvider> {
    Arc::new(
        StaticIdentityProvider::new()
            .with_identity(
                ALICE_TOKEN,
                VerifiedIdentity {
                    subject_id: "uid_123".into(),
                    email: Some("a@b.com".into()),
                    name: Some("Alice".into()),
                },
            )
            .with_identity(
                ADMIN_TOKEN,
                VerifiedIdentity {
                    subject_id: "uid_admin".into(),
                    email: Some("admin@x.com".into()),
                    name: Some("Admin".into()),
                },
            ),
    )
}

/// In-memory state + router for one test.
pub async fn test_state() -> AppState<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    rentora_db::run_migrations(&db).await.unwrap();

    AppState::new(db, provider(), test_auth_config())
}

pub async fn test_app() -> (axum::Router, AppState<Db>) {
    let state = test_state().await;
    (rentora_server::app(state.clone()), state)
}

/// Read a response body as JSON.
pub async fn body_json(response: axum::http::Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn get_bearer(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

pub fn post_json(uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    json_request("POST", uri, token, body)
}

pub fn put_json(uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    json_request("PUT", uri, token, body)
}

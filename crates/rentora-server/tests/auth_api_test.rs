//! API tests for the authentication pipeline: bearer gate, identity
//! sync, role gate, OTP gate, and two-factor enrollment.

mod common;

use axum::http::StatusCode;
use chrono::Utc;
use common::*;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use rentora_auth::SessionClaims;
use rentora_auth::totp;
use rentora_core::models::user::{UpdateUser, UserRole};
use rentora_core::repository::UserRepository;
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

#[tokio::test]
async fn missing_header_is_authentication_required() {
    let (app, state) = test_app().await;

    for request in [
        get("/api/applications"),
        post_json("/api/properties", None, json!({})),
        get("/api/admin/dashboard"),
        get("/api/ads"),
    ] {
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"]["code"], json!("AUTHENTICATION_REQUIRED"));
    }

    // No storage writes happened on rejected requests.
    assert_eq!(state.users.count().await.unwrap(), 0);
}

#[tokio::test]
async fn malformed_header_is_authentication_required() {
    let (app, _state) = test_app().await;

    let request = axum::http::Request::builder()
        .uri("/api/applications")
        .header("authorization", "Token abc123")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], json!("AUTHENTICATION_REQUIRED"));
}

#[tokio::test]
async fn sync_creates_then_reuses_user() {
    let (app, state) = test_app().await;

    let response = app
        .clone()
        .oneshot(post_json("/api/auth/sync", Some(ALICE_TOKEN), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    assert_eq!(body["success"], json!(true));
    assert_eq!(body["user"]["uid"], json!("uid_123"));
    assert_eq!(body["user"]["email"], json!("a@b.com"));
    assert_eq!(body["user"]["role"], json!("tenant"));
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    let first_id = body["user"]["id"].as_str().unwrap().to_string();

    // Second sync returns the identical user, no duplicate row.
    let response = app
        .oneshot(post_json("/api/auth/sync", Some(ALICE_TOKEN), json!({})))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["user"]["id"].as_str().unwrap(), first_id);
    assert_eq!(state.users.count().await.unwrap(), 1);
}

#[tokio::test]
async fn sync_with_unknown_token_is_invalid_token() {
    let (app, state) = test_app().await;

    let response = app
        .oneshot(post_json("/api/auth/sync", Some("forged"), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], json!("INVALID_TOKEN"));
    assert_eq!(state.users.count().await.unwrap(), 0);
}

#[tokio::test]
async fn firebase_route_accepts_body_token() {
    let (app, _state) = test_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/firebase",
            None,
            json!({ "idToken": ALICE_TOKEN, "registrationType": "GOOGLE" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["user"]["uid"], json!("uid_123"));

    // Missing registrationType is a validation error, not a panic.
    let response = app
        .oneshot(post_json(
            "/api/auth/firebase",
            None,
            json!({ "idToken": ALICE_TOKEN }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], json!("VALIDATION_ERROR"));
}

/// Sync the admin identity and promote it to the admin role.
async fn promoted_admin(state: &rentora_server::AppState<surrealdb::engine::local::Db>) {
    let out = state
        .auth
        .sync_identity(
            ADMIN_TOKEN,
            rentora_core::models::user::RegistrationType::Google,
        )
        .await
        .unwrap();
    state
        .users
        .update(
            out.user.id,
            UpdateUser {
                role: Some(UserRole::Admin),
                ..Default::default()
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn role_gate_denies_tenant_admits_admin() {
    let (app, state) = test_app().await;
    promoted_admin(&state).await;

    // Alice is a tenant: denied.
    let response = app
        .clone()
        .oneshot(get_bearer("/api/admin/dashboard", ALICE_TOKEN))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], json!("INSUFFICIENT_PERMISSIONS"));

    // The admin is admitted.
    let response = app
        .oneshot(get_bearer("/api/admin/dashboard", ADMIN_TOKEN))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["stats"]["totalUsers"], json!(2));
}

#[tokio::test]
async fn otp_gate_rejects_until_enrolled() {
    let (app, state) = test_app().await;
    promoted_admin(&state).await;

    // Missing otp in body: validation error.
    let response = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            "/api/admin/delete-admin",
            Some(ADMIN_TOKEN),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], json!("VALIDATION_ERROR"));

    // OTP supplied but two-factor not enrolled: permission error,
    // regardless of the code.
    let response = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            "/api/admin/delete-admin",
            Some(ADMIN_TOKEN),
            json!({ "otp": "123456" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], json!("INSUFFICIENT_PERMISSIONS"));
}

#[tokio::test]
async fn two_factor_enrollment_and_otp_gate() {
    let (app, state) = test_app().await;
    promoted_admin(&state).await;

    // Enroll: init returns a secret and QR code.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/admin/init-2fa",
            None,
            json!({ "email": "admin@x.com" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let secret = body["secret"].as_str().unwrap().to_string();
    assert!(!body["qrCodeBase64"].as_str().unwrap().is_empty());

    // Enable persists the secret.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/admin/enable-2fa",
            None,
            json!({ "email": "admin@x.com", "secret_key": secret }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // A current-window code passes verification.
    let code = totp::current_code(&secret, "Rentora", "admin@x.com").unwrap();
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/admin/verify-otp",
            None,
            json!({ "email": "admin@x.com", "token": code }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));

    // An obviously wrong code fails with INVALID_TOKEN.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/admin/verify-otp",
            None,
            json!({ "email": "admin@x.com", "token": "000000" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"]["code"], json!("INVALID_TOKEN"));

    // The OTP gate now admits a valid code: delete-admin succeeds.
    let code = totp::current_code(&secret, "Rentora", "admin@x.com").unwrap();
    let response = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            "/api/admin/delete-admin",
            Some(ADMIN_TOKEN),
            json!({ "otp": code }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The deleted subject re-syncs as a fresh default-role user, so
    // the role gate rejects the next admin call.
    let response = app
        .oneshot(json_request(
            "DELETE",
            "/api/admin/delete-admin",
            Some(ADMIN_TOKEN),
            json!({ "otp": "000000" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn expired_session_token_is_rejected() {
    let (app, _state) = test_app().await;

    let now = Utc::now().timestamp();
    let claims = SessionClaims {
        sub: Uuid::new_v4().to_string(),
        iat: now - 7200,
        exp: now - 3600,
    };
    let expired = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap();

    let response = app
        .oneshot(get_bearer("/api/ads", &expired))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], json!("INVALID_TOKEN"));
}

#[tokio::test]
async fn register_and_login_flow() {
    let (app, _state) = test_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/mobile/register-user",
            None,
            json!({
                "name": "Bob",
                "surname": "Builder",
                "email": "bob@example.com",
                "phoneNumber": "+27115550100",
                "userType": "landlord",
                "password": "correct-horse-battery",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["token"].as_str().is_some());

    // Duplicate email registration is rejected.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/mobile/register-user",
            None,
            json!({
                "name": "Bob",
                "surname": "Builder",
                "email": "bob@example.com",
                "phoneNumber": "+27115550100",
                "userType": "landlord",
                "password": "another-password",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Login with the right password succeeds.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/mobile/login",
            None,
            json!({ "email": "bob@example.com", "password": "correct-horse-battery" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["user"]["role"], json!("landlord"));

    // Wrong password is a uniform auth failure.
    let response = app
        .oneshot(post_json(
            "/api/mobile/login",
            None,
            json!({ "email": "bob@example.com", "password": "wrong" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn auth_health_endpoint() {
    let (app, _state) = test_app().await;

    let response = app.oneshot(get("/api/auth")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["service"], json!("auth"));
}

//! API tests for the marketplace surface: properties, applications,
//! tickets, settings, and the ads marketplace.

mod common;

use axum::http::StatusCode;
use common::*;
use rentora_auth::secrets;
use rentora_core::models::user::{RegistrationType, UpdateUser, UserRole};
use rentora_core::repository::{SettingsRepository, UserRepository};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn root_banner() {
    let (app, _state) = test_app().await;

    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["service"], json!("rentora-api"));
}

fn listing_body(title: &str, city: &str, price: i64) -> serde_json::Value {
    json!({
        "title": title,
        "price": price,
        "propertyType": "apartment",
        "rentalType": "long_term",
        "bedrooms": 2,
        "bathrooms": 1,
        "location": { "city": city },
        "amenities": ["wifi"],
    })
}

#[tokio::test]
async fn property_crud_and_listing() {
    let (app, _state) = test_app().await;

    // Create requires authentication.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/properties",
            None,
            listing_body("Loft", "Cape Town", 12_000),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Authenticated create works and attaches the caller as landlord.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/properties",
            Some(ALICE_TOKEN),
            listing_body("Loft", "Cape Town", 12_000),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let property_id = body["property"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["property"]["landlord"]["name"], json!("Alice"));

    app.clone()
        .oneshot(post_json(
            "/api/properties",
            Some(ALICE_TOKEN),
            listing_body("Cottage", "Durban", 6_000),
        ))
        .await
        .unwrap();

    // Public listing with a city filter.
    let response = app
        .clone()
        .oneshot(get("/api/properties?location=Cape%20Town"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["pagination"]["total"], json!(1));
    assert_eq!(body["properties"][0]["title"], json!("Loft"));

    // Price filter.
    let response = app
        .clone()
        .oneshot(get("/api/properties?maxPrice=7000"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["pagination"]["total"], json!(1));
    assert_eq!(body["properties"][0]["title"], json!("Cottage"));

    // Limit clamps to 50.
    let response = app
        .clone()
        .oneshot(get("/api/properties?limit=500"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["pagination"]["limit"], json!(50));

    // Public detail view.
    let response = app
        .clone()
        .oneshot(get(&format!("/api/properties/{property_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Unknown id is RESOURCE_NOT_FOUND.
    let response = app
        .clone()
        .oneshot(get(&format!(
            "/api/properties/{}",
            uuid::Uuid::new_v4()
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], json!("RESOURCE_NOT_FOUND"));

    // Search narrows by free-text city query.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/properties/search",
            None,
            json!({ "query": "Durban" }),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["pagination"]["total"], json!(1));

    // A different authenticated user cannot modify Alice's listing.
    let response = app
        .clone()
        .oneshot(put_json(
            &format!("/api/properties/{property_id}"),
            Some(ADMIN_TOKEN),
            json!({ "price": 1 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The owner can.
    let response = app
        .clone()
        .oneshot(put_json(
            &format!("/api/properties/{property_id}"),
            Some(ALICE_TOKEN),
            json!({ "price": 13_000 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["property"]["price"], json!(13_000));

    // And the owner can delete.
    let response = app
        .clone()
        .oneshot(json_request(
            "DELETE",
            &format!("/api/properties/{property_id}"),
            Some(ALICE_TOKEN),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn application_flow() {
    let (app, _state) = test_app().await;

    // Landlord (admin user) owns a property; Alice applies.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/properties",
            Some(ADMIN_TOKEN),
            listing_body("Flat", "Cape Town", 9_000),
        ))
        .await
        .unwrap();
    let property_id = body_json(response).await["property"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    // Applying for a missing property fails before any write.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/applications",
            Some(ALICE_TOKEN),
            json!({ "propertyId": uuid::Uuid::new_v4() }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/applications",
            Some(ALICE_TOKEN),
            json!({ "propertyId": property_id, "message": "Keen!" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let application_id = body["application"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["application"]["status"], json!("pending"));

    // Alice sees her own application with the property joined.
    let response = app
        .clone()
        .oneshot(get_bearer("/api/applications", ALICE_TOKEN))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["pagination"]["total"], json!(1));
    assert_eq!(
        body["applications"][0]["property"]["title"],
        json!("Flat")
    );

    // The applicant cannot approve their own application.
    let response = app
        .clone()
        .oneshot(put_json(
            &format!("/api/applications/{application_id}/status"),
            Some(ALICE_TOKEN),
            json!({ "status": "approved" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The property's landlord can.
    let response = app
        .clone()
        .oneshot(put_json(
            &format!("/api/applications/{application_id}/status"),
            Some(ADMIN_TOKEN),
            json!({ "status": "approved", "message": "Welcome" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["application"]["status"], json!("approved"));
}

#[tokio::test]
async fn ticket_lifecycle_over_http() {
    let (app, _state) = test_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/tickets",
            None,
            json!({
                "subject": "Login broken",
                "description": "Cannot sign in since yesterday",
                "priority": "urgent",
                "category": "technical",
                "customerEmail": "customer@example.com",
                "customerName": "Customer",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["ticket"]["ticketNumber"], json!("TKT-001"));
    let ticket_id = body["ticket"]["id"].as_str().unwrap().to_string();

    // Config listings.
    let response = app.clone().oneshot(get("/api/tickets/priorities")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["priorities"], json!(["low", "medium", "high", "urgent"]));

    // Messages.
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/tickets/{ticket_id}/messages"),
            None,
            json!({ "author": "Agent", "body": "On it" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Escalate then close.
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/tickets/{ticket_id}/escalate"),
            None,
            json!({}),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["ticket"]["status"], json!("escalated"));

    app.clone()
        .oneshot(post_json(
            &format!("/api/tickets/{ticket_id}/close"),
            None,
            json!({}),
        ))
        .await
        .unwrap();

    // Stats reflect the closure.
    let response = app.oneshot(get("/api/tickets/stats")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["stats"]["total"], json!(1));
    assert_eq!(body["stats"]["closed"], json!(1));
}

/// Promote the admin identity so settings routes are reachable.
async fn admin_ready(state: &rentora_server::AppState<surrealdb::engine::local::Db>) {
    let out = state
        .auth
        .sync_identity(ADMIN_TOKEN, RegistrationType::Google)
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
async fn settings_are_admin_gated() {
    let (app, state) = test_app().await;
    admin_ready(&state).await;

    let response = app
        .clone()
        .oneshot(get_bearer("/api/settings/app", ALICE_TOKEN))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(get_bearer("/api/settings/app", ADMIN_TOKEN))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["settings"], json!(null));
}

#[tokio::test]
async fn smtp_password_is_encrypted_at_rest() {
    let (app, state) = test_app().await;
    admin_ready(&state).await;

    // App settings row must exist first.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/settings/app",
            Some(ADMIN_TOKEN),
            json!({ "appName": "Rentora" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/settings/smtp",
            Some(ADMIN_TOKEN),
            json!({
                "host": "smtp.example.com",
                "port": 587,
                "username": "mailer",
                "password": "hunter2",
                "fromEmail": "noreply@rentora.example",
                "fromName": "Rentora",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    // The response carries no password material, only a flag.
    assert_eq!(body["smtp"]["hasPassword"], json!(true));
    assert!(body["smtp"].get("password").is_none());
    assert!(body["smtp"].get("password_enc").is_none());

    // At rest the password is AES-GCM ciphertext that decrypts back.
    let stored = state.settings.get_smtp().await.unwrap().unwrap();
    assert_ne!(stored.password_enc, "hunter2");
    let key = test_auth_config().secret_encryption_key.unwrap();
    let plain = secrets::decrypt_secret(&key, &stored.password_enc).unwrap();
    assert_eq!(plain, b"hunter2");
}

#[tokio::test]
async fn ads_require_session_token_and_enforce_limits() {
    let (app, state) = test_app().await;

    // A locally issued session token (from sync) opens the ads surface.
    let out = state
        .auth
        .sync_identity(ALICE_TOKEN, RegistrationType::Google)
        .await
        .unwrap();
    let session = out.token;

    // The external token is not a valid session token here.
    let response = app
        .clone()
        .oneshot(get_bearer("/api/ads", ALICE_TOKEN))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Image cap enforced.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/ads",
            Some(&session),
            json!({
                "title": "Plumbing",
                "description": "Pipes fixed fast",
                "category": "plumbing",
                "location": { "city": "Cape Town" },
                "price": 450,
                "images": ["1.jpg", "2.jpg", "3.jpg", "4.jpg"],
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/ads",
            Some(&session),
            json!({
                "title": "Plumbing",
                "description": "Pipes fixed fast",
                "category": "plumbing",
                "location": { "city": "Cape Town" },
                "price": 450,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let ad_id = body["adId"].as_str().unwrap().to_string();

    // Bidding bumps the count.
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/ads/{ad_id}/bids"),
            Some(&session),
            json!({ "amount": 400 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get_bearer(&format!("/api/ads/{ad_id}"), &session))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["bidCount"], json!(1));

    // Catalogue upsert.
    let response = app
        .oneshot(post_json(
            "/api/catalogue",
            Some(&session),
            json!({ "services": ["plumbing", "tiling"] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["catalogue"]["services"], json!(["plumbing", "tiling"]));
}

//! Integration tests for the authentication service.

use std::sync::Arc;

use rentora_auth::config::AuthConfig;
use rentora_auth::identity::{StaticIdentityProvider, VerifiedIdentity};
use rentora_auth::service::{AuthService, RegisterInput};
use rentora_auth::{token, totp};
use rentora_core::error::RentoraError;
use rentora_core::models::user::{RegistrationType, UserRole};
use rentora_db::repository::SurrealUserRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

fn test_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "test-secret-0123456789".into(),
        session_lifetime_secs: 604_800,
        ..AuthConfig::default()
    }
}

fn provider() -> Arc<StaticIdentityProvider> {
    Arc::new(
        StaticIdentityProvider::new()
            .with_identity(
                "good-token",
                VerifiedIdentity {
                    subject_id: "uid_123".into(),
                    email: Some("a@b.com".into()),
                    name: Some("Alice".into()),
                },
            )
            .with_identity(
                "bare-token",
                VerifiedIdentity {
                    subject_id: "uid_bare".into(),
                    email: None,
                    name: None,
                },
            ),
    )
}

/// Spin up in-memory DB, run migrations, build the service.
async fn setup() -> AuthService<SurrealUserRepository<surrealdb::engine::local::Db>> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    rentora_db::run_migrations(&db).await.unwrap();

    AuthService::new(
        SurrealUserRepository::new(db),
        provider(),
        test_config(),
    )
}

#[tokio::test]
async fn sync_creates_user_on_first_sight() {
    let svc = setup().await;

    let out = svc
        .sync_identity("good-token", RegistrationType::Google)
        .await
        .unwrap();

    assert_eq!(out.user.subject_id.as_deref(), Some("uid_123"));
    assert_eq!(out.user.email, "a@b.com");
    assert_eq!(out.user.name, "Alice");
    assert_eq!(out.user.surname, "");
    assert_eq!(out.user.role, UserRole::Tenant);
    assert!(out.user.password_hash.is_none());
    assert!(!out.user.two_factor_enabled);

    // The issued token decodes back to the user.
    let claims = token::decode_session_token(&out.token, svc.config()).unwrap();
    assert_eq!(claims.user_id().unwrap(), out.user.id);
}

#[tokio::test]
async fn sync_is_idempotent() {
    let svc = setup().await;

    let first = svc
        .sync_identity("good-token", RegistrationType::Google)
        .await
        .unwrap();
    let second = svc
        .sync_identity("good-token", RegistrationType::Google)
        .await
        .unwrap();

    // Replaying the same verified subject never creates a second row.
    assert_eq!(first.user.id, second.user.id);
}

#[tokio::test]
async fn sync_without_email_uses_sentinel() {
    let svc = setup().await;

    let out = svc
        .sync_identity("bare-token", RegistrationType::Google)
        .await
        .unwrap();

    assert_eq!(out.user.email, "unknown@rentora.local");
    assert_eq!(out.user.name, "");
}

#[tokio::test]
async fn sync_with_invalid_token_fails_without_writes() {
    let svc = setup().await;

    let err = svc
        .sync_identity("bogus", RegistrationType::Google)
        .await
        .unwrap_err();
    assert!(matches!(err, RentoraError::AuthenticationFailed { .. }));
}

#[tokio::test]
async fn register_and_login_roundtrip() {
    let svc = setup().await;

    let registered = svc
        .register(RegisterInput {
            name: "Bob".into(),
            surname: "Builder".into(),
            email: "bob@example.com".into(),
            phone: None,
            role: UserRole::Landlord,
            password: "correct-horse-battery".into(),
        })
        .await
        .unwrap();
    assert_eq!(registered.user.role, UserRole::Landlord);

    let login = svc
        .login("bob@example.com", "correct-horse-battery")
        .await
        .unwrap();
    assert_eq!(login.user.id, registered.user.id);
    assert!(!login.token.is_empty());
}

#[tokio::test]
async fn login_wrong_password_fails() {
    let svc = setup().await;

    svc.register(RegisterInput {
        name: "Bob".into(),
        surname: String::new(),
        email: "bob@example.com".into(),
        phone: None,
        role: UserRole::Tenant,
        password: "correct-horse-battery".into(),
    })
    .await
    .unwrap();

    let err = svc
        .login("bob@example.com", "wrong-password")
        .await
        .unwrap_err();
    assert!(matches!(err, RentoraError::AuthenticationFailed { .. }));
}

#[tokio::test]
async fn login_unknown_email_fails_uniformly() {
    let svc = setup().await;

    let err = svc.login("nobody@example.com", "whatever").await.unwrap_err();
    assert!(matches!(err, RentoraError::AuthenticationFailed { .. }));
}

#[tokio::test]
async fn federated_account_cannot_password_login() {
    let svc = setup().await;

    svc.sync_identity("good-token", RegistrationType::Google)
        .await
        .unwrap();

    let err = svc.login("a@b.com", "anything").await.unwrap_err();
    assert!(matches!(err, RentoraError::AuthenticationFailed { .. }));
}

#[tokio::test]
async fn session_token_authenticates_user() {
    let svc = setup().await;

    let out = svc
        .sync_identity("good-token", RegistrationType::Google)
        .await
        .unwrap();

    let user = svc.authenticate_session(&out.token).await.unwrap();
    assert_eq!(user.id, out.user.id);

    assert!(svc.authenticate_session("not-a-token").await.is_err());
}

#[tokio::test]
async fn two_factor_enrollment_flow() {
    let svc = setup().await;

    svc.sync_identity("good-token", RegistrationType::Google)
        .await
        .unwrap();

    // Verify before enrollment is a permission failure.
    let err = svc.verify_two_factor("a@b.com", "123456").await.unwrap_err();
    assert!(matches!(err, RentoraError::AuthorizationDenied { .. }));

    // Init generates a secret but persists nothing yet.
    let enrollment = svc.init_two_factor("a@b.com").unwrap();
    let before = svc.verify_two_factor("a@b.com", "123456").await;
    assert!(before.is_err());

    // Enable persists the secret.
    let enabled = svc
        .enable_two_factor("a@b.com", &enrollment.secret)
        .await
        .unwrap();
    assert!(enabled.two_factor_enabled);

    // A current-window code from the stored secret passes.
    let code = totp::current_code(&enrollment.secret, "Rentora", "a@b.com").unwrap();
    assert!(svc.verify_two_factor("a@b.com", &code).await.unwrap());

    // An obviously wrong code fails verification (but not with an error).
    assert!(!svc.verify_two_factor("a@b.com", "000000").await.unwrap());

    // A code from a different secret fails.
    let other = svc.init_two_factor("a@b.com").unwrap();
    let foreign = totp::current_code(&other.secret, "Rentora", "a@b.com").unwrap();
    assert!(!svc.verify_two_factor("a@b.com", &foreign).await.unwrap());
}

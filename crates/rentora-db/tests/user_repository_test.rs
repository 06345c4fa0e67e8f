//! Integration tests for the User repository using in-memory SurrealDB.

use rentora_core::error::RentoraError;
use rentora_core::models::user::{CreateUser, RegistrationType, UpdateUser, UserRole};
use rentora_core::repository::{Pagination, UserRepository};
use rentora_db::repository::SurrealUserRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

/// Helper: spin up in-memory DB and run migrations.
async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    rentora_db::run_migrations(&db).await.unwrap();
    db
}

fn federated_user(subject_id: &str, email: &str) -> CreateUser {
    CreateUser {
        subject_id: Some(subject_id.into()),
        email: email.into(),
        name: "Alice".into(),
        surname: String::new(),
        password: None,
        phone: None,
        role: UserRole::Tenant,
        registration_type: RegistrationType::Google,
    }
}

#[tokio::test]
async fn create_and_get_federated_user() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo
        .create(federated_user("uid_123", "alice@example.com"))
        .await
        .unwrap();

    assert_eq!(user.subject_id.as_deref(), Some("uid_123"));
    assert_eq!(user.email, "alice@example.com");
    assert_eq!(user.role, UserRole::Tenant);
    assert!(user.password_hash.is_none());
    assert!(!user.two_factor_enabled);

    let fetched = repo.get_by_id(user.id).await.unwrap();
    assert_eq!(fetched.id, user.id);

    let by_subject = repo.get_by_subject_id("uid_123").await.unwrap();
    assert_eq!(by_subject.id, user.id);

    let by_email = repo.get_by_email("alice@example.com").await.unwrap();
    assert_eq!(by_email.id, user.id);
}

#[tokio::test]
async fn duplicate_subject_id_is_rejected() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    repo.create(federated_user("uid_dup", "first@example.com"))
        .await
        .unwrap();

    let err = repo
        .create(federated_user("uid_dup", "second@example.com"))
        .await
        .unwrap_err();

    assert!(
        matches!(err, RentoraError::AlreadyExists { .. }),
        "expected AlreadyExists, got: {err:?}"
    );
}

#[tokio::test]
async fn password_user_gets_argon2_hash() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo
        .create(CreateUser {
            subject_id: None,
            email: "bob@example.com".into(),
            name: "Bob".into(),
            surname: "Builder".into(),
            password: Some("SuperSecret123!".into()),
            phone: Some("+27115550100".into()),
            role: UserRole::Landlord,
            registration_type: RegistrationType::Email,
        })
        .await
        .unwrap();

    // Password must be hashed, never stored in plaintext.
    let hash = user.password_hash.as_deref().unwrap();
    assert_ne!(hash, "SuperSecret123!");
    assert!(hash.starts_with("$argon2id$"));
    assert_eq!(user.role, UserRole::Landlord);
}

#[tokio::test]
async fn unknown_subject_id_is_not_found() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let err = repo.get_by_subject_id("uid_missing").await.unwrap_err();
    assert!(matches!(err, RentoraError::NotFound { .. }));
}

#[tokio::test]
async fn update_two_factor_fields() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo
        .create(federated_user("uid_2fa", "2fa@example.com"))
        .await
        .unwrap();

    let updated = repo
        .update(
            user.id,
            UpdateUser {
                two_factor_enabled: Some(true),
                two_factor_secret: Some(Some("JBSWY3DPEHPK3PXP".into())),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(updated.two_factor_enabled);
    assert_eq!(updated.two_factor_secret.as_deref(), Some("JBSWY3DPEHPK3PXP"));

    // Clearing the secret works through the double-Option.
    let cleared = repo
        .update(
            user.id,
            UpdateUser {
                two_factor_enabled: Some(false),
                two_factor_secret: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(!cleared.two_factor_enabled);
    assert!(cleared.two_factor_secret.is_none());
}

#[tokio::test]
async fn role_promotion_persists() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo
        .create(federated_user("uid_admin", "admin@example.com"))
        .await
        .unwrap();

    let promoted = repo
        .update(
            user.id,
            UpdateUser {
                role: Some(UserRole::Admin),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(promoted.role, UserRole::Admin);

    let fetched = repo.get_by_id(user.id).await.unwrap();
    assert_eq!(fetched.role, UserRole::Admin);
}

#[tokio::test]
async fn list_and_count_users() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    for i in 0..3 {
        repo.create(federated_user(
            &format!("uid_{i}"),
            &format!("user{i}@example.com"),
        ))
        .await
        .unwrap();
    }

    assert_eq!(repo.count().await.unwrap(), 3);

    let page = repo
        .list(Pagination {
            offset: 0,
            limit: 2,
        })
        .await
        .unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total, 3);
}

#[tokio::test]
async fn delete_removes_user() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo
        .create(federated_user("uid_del", "del@example.com"))
        .await
        .unwrap();

    repo.delete(user.id).await.unwrap();

    let err = repo.get_by_id(user.id).await.unwrap_err();
    assert!(matches!(err, RentoraError::NotFound { .. }));
}

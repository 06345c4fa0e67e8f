//! Integration tests for the Settings and Ad repositories using
//! in-memory SurrealDB.

use rentora_core::models::ad::{CreateAdBid, CreateServiceAd, UpdateServiceAd};
use rentora_core::models::settings::{CreateAppSettings, SmtpConfig, UpdateAppSettings, UpdateSmtpConfig};
use rentora_core::repository::{AdRepository, SettingsRepository};
use rentora_db::repository::{SurrealAdRepository, SurrealSettingsRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    rentora_db::run_migrations(&db).await.unwrap();
    db
}

fn app_settings(name: &str) -> CreateAppSettings {
    CreateAppSettings {
        app_name: name.into(),
        logo_url: None,
        favicon_url: None,
        maps_api_key: None,
        allowed_regions: Some(vec!["ZA".into()]),
        primary_color: None,
        secondary_color: None,
        support_email: Some("support@rentora.example".into()),
        support_phone: None,
        terms_and_conditions: None,
        privacy_policy: None,
        about_page: None,
        disclaimer: None,
        email_header_text: None,
        email_footer_text: None,
        website_url: None,
        company_address: None,
        company_phone: None,
    }
}

#[tokio::test]
async fn latest_settings_row_wins() {
    let db = setup().await;
    let repo = SurrealSettingsRepository::new(db);

    assert!(repo.get_latest().await.unwrap().is_none());

    repo.save(app_settings("First")).await.unwrap();
    let second = repo.save(app_settings("Second")).await.unwrap();

    let latest = repo.get_latest().await.unwrap().unwrap();
    assert_eq!(latest.app_name, "Second");
    assert_eq!(latest.id, second.id);
    assert_eq!(latest.primary_color, "#000000");
}

#[tokio::test]
async fn update_settings_in_place() {
    let db = setup().await;
    let repo = SurrealSettingsRepository::new(db);

    // No row yet: update is a no-op.
    let missing = repo
        .update(UpdateAppSettings {
            app_name: Some("Nope".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(missing.is_none());

    repo.save(app_settings("Rentora")).await.unwrap();
    let updated = repo
        .update(UpdateAppSettings {
            support_phone: Some("+27115550199".into()),
            ..Default::default()
        })
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.app_name, "Rentora");
    assert_eq!(updated.support_phone, "+27115550199");
}

#[tokio::test]
async fn smtp_config_roundtrip() {
    let db = setup().await;
    let repo = SurrealSettingsRepository::new(db);

    repo.save(app_settings("Rentora")).await.unwrap();

    let saved = repo
        .save_smtp(SmtpConfig {
            host: "smtp.example.com".into(),
            port: 465,
            username: "mailer".into(),
            password_enc: "bm9uY2U6Y2lwaGVydGV4dA==".into(),
            encryption: "ssl".into(),
            from_email: "noreply@rentora.example".into(),
            from_name: "Rentora".into(),
            active: true,
        })
        .await
        .unwrap();
    assert_eq!(saved.port, 465);

    let fetched = repo.get_smtp().await.unwrap().unwrap();
    assert_eq!(fetched.host, "smtp.example.com");
    assert!(fetched.active);

    let updated = repo
        .update_smtp(UpdateSmtpConfig {
            port: Some(587),
            encryption: Some("tls".into()),
            ..Default::default()
        })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.port, 587);
    assert_eq!(updated.encryption, "tls");
    // Untouched fields survive a partial update.
    assert_eq!(updated.username, "mailer");
}

fn ad(title: &str) -> CreateServiceAd {
    CreateServiceAd {
        title: title.into(),
        owner_id: Some(Uuid::new_v4()),
        owner_name: "Pat the Plumber".into(),
        description: "Pipes fixed fast".into(),
        category: "plumbing".into(),
        location: serde_json::json!({ "city": "Cape Town" }),
        price: 450,
        images: vec!["img1.jpg".into()],
        documents: vec![],
    }
}

#[tokio::test]
async fn ad_crud_roundtrip() {
    let db = setup().await;
    let repo = SurrealAdRepository::new(db);

    let created = repo.create_ad(ad("Geyser repairs")).await.unwrap();
    assert_eq!(created.bid_count, 0);
    assert_eq!(created.status.as_str(), "open");

    let updated = repo
        .update_ad(
            created.id,
            UpdateServiceAd {
                price: Some(500),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.price, 500);

    let all = repo.list_ads().await.unwrap();
    assert_eq!(all.len(), 1);

    repo.delete_ad(created.id).await.unwrap();
    assert!(repo.get_ad(created.id).await.is_err());
}

#[tokio::test]
async fn bids_increment_ad_count() {
    let db = setup().await;
    let repo = SurrealAdRepository::new(db);

    let created = repo.create_ad(ad("Garden cleanup")).await.unwrap();

    for amount in [300, 350] {
        repo.create_bid(CreateAdBid {
            ad_id: created.id,
            bidder_id: Uuid::new_v4(),
            bidder_name: "Bidder".into(),
            amount,
            message: None,
        })
        .await
        .unwrap();
    }

    let after = repo.get_ad(created.id).await.unwrap();
    assert_eq!(after.bid_count, 2);

    let bids = repo.list_bids(Some(created.id)).await.unwrap();
    assert_eq!(bids.len(), 2);

    // Deleting the ad cascades to its bids.
    repo.delete_ad(created.id).await.unwrap();
    assert!(repo.list_bids(Some(created.id)).await.unwrap().is_empty());
}

#[tokio::test]
async fn catalogue_upsert_replaces_services() {
    let db = setup().await;
    let repo = SurrealAdRepository::new(db);

    let provider = Uuid::new_v4();
    assert!(repo.get_catalogue(provider).await.unwrap().is_none());

    let first = repo
        .upsert_catalogue(provider, vec!["plumbing".into(), "tiling".into()])
        .await
        .unwrap();
    assert_eq!(first.services.len(), 2);

    let second = repo
        .upsert_catalogue(provider, vec!["plumbing".into()])
        .await
        .unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.services, vec!["plumbing".to_string()]);
}

//! Integration tests for the Property and Application repositories
//! using in-memory SurrealDB.

use rentora_core::models::application::{ApplicationStatus, CreateApplication};
use rentora_core::models::property::{
    CreateProperty, PropertyFilters, PropertySort, SortOrder, UpdateProperty,
};
use rentora_core::repository::{ApplicationRepository, Pagination, PropertyRepository};
use rentora_db::repository::{SurrealApplicationRepository, SurrealPropertyRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    rentora_db::run_migrations(&db).await.unwrap();
    db
}

fn listing(title: &str, city: &str, price: i64, bedrooms: u32) -> CreateProperty {
    CreateProperty {
        title: title.into(),
        description: None,
        price,
        currency: None,
        property_type: "apartment".into(),
        rental_type: "long_term".into(),
        rental_period: None,
        bedrooms,
        bathrooms: 1,
        area: None,
        location: serde_json::json!({ "city": city, "suburb": "Central" }),
        amenities: vec!["wifi".into(), "parking".into()],
        images: vec![],
        landlord_id: Uuid::new_v4(),
        available_date: None,
    }
}

#[tokio::test]
async fn create_applies_defaults() {
    let db = setup().await;
    let repo = SurrealPropertyRepository::new(db);

    let property = repo
        .create(listing("Loft", "Cape Town", 12_000, 2))
        .await
        .unwrap();

    assert_eq!(property.currency, "ZAR");
    assert_eq!(property.rental_period, "monthly");
    assert_eq!(property.status.as_str(), "available");
    assert_eq!(property.city(), Some("Cape Town"));
}

#[tokio::test]
async fn filters_narrow_results() {
    let db = setup().await;
    let repo = SurrealPropertyRepository::new(db);

    repo.create(listing("A", "Cape Town", 8_000, 1)).await.unwrap();
    repo.create(listing("B", "Cape Town", 15_000, 3)).await.unwrap();
    repo.create(listing("C", "Johannesburg", 9_000, 2))
        .await
        .unwrap();

    let by_city = repo
        .list(
            PropertyFilters {
                city: Some("Cape Town".into()),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(by_city.total, 2);

    let by_price = repo
        .list(
            PropertyFilters {
                min_price: Some(9_000),
                max_price: Some(12_000),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(by_price.total, 1);
    assert_eq!(by_price.items[0].title, "C");

    let by_bedrooms = repo
        .list(
            PropertyFilters {
                bedrooms: Some(3),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(by_bedrooms.total, 1);
    assert_eq!(by_bedrooms.items[0].title, "B");
}

#[tokio::test]
async fn amenity_filter_requires_all() {
    let db = setup().await;
    let repo = SurrealPropertyRepository::new(db);

    let mut bare = listing("Bare", "Durban", 5_000, 1);
    bare.amenities = vec!["wifi".into()];
    repo.create(bare).await.unwrap();
    repo.create(listing("Full", "Durban", 6_000, 1)).await.unwrap();

    let both = repo
        .list(
            PropertyFilters {
                amenities: vec!["wifi".into(), "parking".into()],
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(both.total, 1);
    assert_eq!(both.items[0].title, "Full");
}

#[tokio::test]
async fn price_sort_orders_results() {
    let db = setup().await;
    let repo = SurrealPropertyRepository::new(db);

    repo.create(listing("Mid", "Pretoria", 10_000, 2)).await.unwrap();
    repo.create(listing("Cheap", "Pretoria", 4_000, 1)).await.unwrap();
    repo.create(listing("Dear", "Pretoria", 20_000, 4)).await.unwrap();

    let ascending = repo
        .list(
            PropertyFilters {
                sort_by: Some(PropertySort::Price),
                sort_order: Some(SortOrder::Asc),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();

    let titles: Vec<&str> = ascending.items.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Cheap", "Mid", "Dear"]);
}

#[tokio::test]
async fn update_and_delete_property() {
    let db = setup().await;
    let repo = SurrealPropertyRepository::new(db);

    let property = repo
        .create(listing("Old title", "Cape Town", 7_000, 1))
        .await
        .unwrap();

    let updated = repo
        .update(
            property.id,
            UpdateProperty {
                title: Some("New title".into()),
                price: Some(7_500),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.title, "New title");
    assert_eq!(updated.price, 7_500);

    repo.delete(property.id).await.unwrap();
    assert!(repo.get_by_id(property.id).await.is_err());
}

#[tokio::test]
async fn applications_lifecycle() {
    let db = setup().await;
    let properties = SurrealPropertyRepository::new(db.clone());
    let applications = SurrealApplicationRepository::new(db);

    let property = properties
        .create(listing("For rent", "Cape Town", 11_000, 2))
        .await
        .unwrap();
    let tenant_id = Uuid::new_v4();

    let application = applications
        .create(CreateApplication {
            property_id: property.id,
            tenant_id,
            move_in_date: None,
            message: Some("Keen to move in".into()),
            documents: None,
        })
        .await
        .unwrap();
    assert_eq!(application.status, ApplicationStatus::Pending);

    let approved = applications
        .update_status(
            application.id,
            ApplicationStatus::Approved,
            Some("Welcome aboard".into()),
        )
        .await
        .unwrap();
    assert_eq!(approved.status, ApplicationStatus::Approved);
    assert_eq!(approved.message.as_deref(), Some("Welcome aboard"));

    let mine = applications
        .list_by_tenant(tenant_id, None, Pagination::default())
        .await
        .unwrap();
    assert_eq!(mine.total, 1);

    let pending_only = applications
        .list_by_tenant(tenant_id, Some(ApplicationStatus::Pending), Pagination::default())
        .await
        .unwrap();
    assert_eq!(pending_only.total, 0);

    assert_eq!(applications.count().await.unwrap(), 1);
    assert_eq!(applications.count_pending().await.unwrap(), 0);
}

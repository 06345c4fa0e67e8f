//! Property listing, search, and landlord-gated CRUD.

use std::collections::HashMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use rentora_core::models::property::{
    CreateProperty, Property, PropertyFilters, PropertySort, SortOrder, UpdateProperty,
};
use rentora_core::models::user::UserRole;
use rentora_core::repository::{PropertyRepository, UserRepository};
use serde::{Deserialize, Serialize};
use serde_json::json;
use surrealdb::Connection;
use uuid::Uuid;

use super::{PageInfo, page_params, validated_json};
use crate::error::ApiError;
use crate::gate::{CurrentUser, federated_auth, success};
use crate::state::AppState;

pub fn router<C: Connection>(state: AppState<C>) -> Router {
    use axum::handler::Handler;

    let auth = from_fn_with_state(state.clone(), federated_auth::<C>);

    Router::new()
        .route(
            "/",
            get(list_properties::<C>).post(create_property::<C>.layer(auth.clone())),
        )
        .route(
            "/search",
            post(search_properties::<C>),
        )
        .route(
            "/{propertyId}",
            get(get_property::<C>)
                .put(update_property::<C>.layer(auth.clone()))
                .delete(delete_property::<C>.layer(auth)),
        )
        .with_state(state)
}

/// Landlord summary embedded in property payloads.
#[derive(Debug, Clone, Serialize)]
struct LandlordSummary {
    id: Uuid,
    name: String,
    avatar: Option<String>,
    verified: bool,
}

#[derive(Debug, Serialize)]
struct PropertyPayload {
    #[serde(flatten)]
    property: Property,
    landlord: Option<LandlordSummary>,
}

/// Attach landlord summaries, fetching each distinct landlord once.
async fn with_landlords<C: Connection>(
    state: &AppState<C>,
    properties: Vec<Property>,
) -> Vec<PropertyPayload> {
    let mut landlords: HashMap<Uuid, Option<LandlordSummary>> = HashMap::new();

    let mut payloads = Vec::with_capacity(properties.len());
    for property in properties {
        if !landlords.contains_key(&property.landlord_id) {
            let summary = match state.users.get_by_id(property.landlord_id).await {
                Ok(user) => Some(LandlordSummary {
                    id: user.id,
                    name: format!("{} {}", user.name, user.surname).trim().to_string(),
                    avatar: None,
                    verified: false,
                }),
                Err(_) => None,
            };
            landlords.insert(property.landlord_id, summary);
        }
        payloads.push(PropertyPayload {
            landlord: landlords[&property.landlord_id].clone(),
            property,
        });
    }
    payloads
}

#[derive(Debug, Deserialize, Default)]
struct PropertyListQuery {
    page: Option<u64>,
    limit: Option<u64>,
    location: Option<String>,
    #[serde(rename = "minPrice")]
    min_price: Option<i64>,
    #[serde(rename = "maxPrice")]
    max_price: Option<i64>,
    #[serde(rename = "propertyType")]
    property_type: Option<String>,
    bedrooms: Option<u32>,
    bathrooms: Option<u32>,
    #[serde(rename = "rentalType")]
    rental_type: Option<String>,
    /// Comma-separated amenity list.
    amenities: Option<String>,
    #[serde(rename = "sortBy")]
    sort_by: Option<PropertySort>,
    #[serde(rename = "sortOrder")]
    sort_order: Option<SortOrder>,
}

impl PropertyListQuery {
    fn into_filters(self) -> PropertyFilters {
        PropertyFilters {
            city: self.location,
            min_price: self.min_price,
            max_price: self.max_price,
            property_type: self.property_type,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            rental_type: self.rental_type,
            amenities: self
                .amenities
                .map(|a| {
                    a.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            sort_by: self.sort_by,
            sort_order: self.sort_order,
        }
    }
}

/// GET /api/properties — public listing with filters and pagination.
async fn list_properties<C: Connection>(
    State(state): State<AppState<C>>,
    Query(query): Query<PropertyListQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (pagination, page, limit) = page_params(query.page, query.limit);
    let filters = query.into_filters();

    let result = state.properties.list(filters, pagination).await?;
    let total = result.total;
    let payloads = with_landlords(&state, result.items).await;

    Ok(success(json!({
        "properties": payloads,
        "pagination": PageInfo::new(page, limit, total),
    })))
}

/// GET /api/properties/{propertyId} — public detail view.
async fn get_property<C: Connection>(
    State(state): State<AppState<C>>,
    Path(property_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let property = state.properties.get_by_id(property_id).await?;
    let mut payloads = with_landlords(&state, vec![property]).await;

    Ok(success(json!({ "property": payloads.remove(0) })))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SearchRequest {
    query: Option<String>,
    filters: Option<PropertyListQuery>,
    #[serde(rename = "sortBy")]
    sort_by: Option<PropertySort>,
    #[serde(rename = "sortOrder")]
    sort_order: Option<SortOrder>,
}

/// POST /api/properties/search — body-driven search; a free-text query
/// narrows by city.
async fn search_properties<C: Connection>(
    State(state): State<AppState<C>>,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let req = validated_json(body)?;

    let inner = req.filters.unwrap_or_default();
    let (pagination, page, limit) = page_params(inner.page, inner.limit);
    let mut filters = inner.into_filters();
    if let Some(query) = req.query {
        filters.city = Some(query);
    }
    filters.sort_by = req.sort_by.or(filters.sort_by);
    filters.sort_order = req.sort_order.or(filters.sort_order);

    let result = state.properties.list(filters, pagination).await?;
    let total = result.total;
    let payloads = with_landlords(&state, result.items).await;

    Ok(success(json!({
        "properties": payloads,
        "pagination": PageInfo::new(page, limit, total),
    })))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CreatePropertyRequest {
    title: String,
    description: Option<String>,
    price: i64,
    currency: Option<String>,
    #[serde(rename = "propertyType")]
    property_type: String,
    #[serde(rename = "rentalType")]
    rental_type: String,
    #[serde(rename = "rentalPeriod")]
    rental_period: Option<String>,
    bedrooms: u32,
    bathrooms: u32,
    area: Option<f64>,
    location: serde_json::Value,
    amenities: Option<Vec<String>>,
    images: Option<Vec<String>>,
    #[serde(rename = "availableDate")]
    available_date: Option<DateTime<Utc>>,
}

/// POST /api/properties — create a listing owned by the caller.
async fn create_property<C: Connection>(
    State(state): State<AppState<C>>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<CreatePropertyRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let req = validated_json(body)?;

    if req.title.trim().is_empty() {
        return Err(ApiError::Validation("title is required".into()));
    }
    if req.price < 0 {
        return Err(ApiError::Validation("price must not be negative".into()));
    }

    let property = state
        .properties
        .create(CreateProperty {
            title: req.title,
            description: req.description,
            price: req.price,
            currency: req.currency,
            property_type: req.property_type,
            rental_type: req.rental_type,
            rental_period: req.rental_period,
            bedrooms: req.bedrooms,
            bathrooms: req.bathrooms,
            area: req.area,
            location: req.location,
            amenities: req.amenities.unwrap_or_default(),
            images: req.images.unwrap_or_default(),
            landlord_id: user.id,
            available_date: req.available_date,
        })
        .await?;

    let mut payloads = with_landlords(&state, vec![property]).await;
    Ok(success(json!({ "property": payloads.remove(0) })))
}

/// Owner-or-admin check shared by update and delete.
fn authorize_owner(property: &Property, user_id: Uuid, role: UserRole) -> Result<(), ApiError> {
    if property.landlord_id != user_id && role != UserRole::Admin {
        return Err(ApiError::InsufficientPermissions(
            "only the owning landlord or an admin may modify this listing".into(),
        ));
    }
    Ok(())
}

/// PUT /api/properties/{propertyId} — owner or admin only.
async fn update_property<C: Connection>(
    State(state): State<AppState<C>>,
    CurrentUser(user): CurrentUser,
    Path(property_id): Path<Uuid>,
    body: Result<Json<UpdateProperty>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let update = validated_json(body)?;

    let existing = state.properties.get_by_id(property_id).await?;
    authorize_owner(&existing, user.id, user.role)?;

    let property = state.properties.update(property_id, update).await?;
    let mut payloads = with_landlords(&state, vec![property]).await;

    Ok(success(json!({ "property": payloads.remove(0) })))
}

/// DELETE /api/properties/{propertyId} — owner or admin only.
async fn delete_property<C: Connection>(
    State(state): State<AppState<C>>,
    CurrentUser(user): CurrentUser,
    Path(property_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let existing = state.properties.get_by_id(property_id).await?;
    authorize_owner(&existing, user.id, user.role)?;

    state.properties.delete(property_id).await?;

    Ok(success(json!({ "message": "Property deleted" })))
}

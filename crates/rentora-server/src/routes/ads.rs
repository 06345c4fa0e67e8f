//! Service-provider marketplace routes: ads, bids, and catalogues.
//! All routes require a locally issued session token.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::{Json, Router};
use rentora_core::models::ad::{
    AdStatus, CreateAdBid, CreateServiceAd, MAX_AD_DOCUMENTS, MAX_AD_IMAGES, UpdateAdBid,
    UpdateServiceAd,
};
use serde::Deserialize;
use serde_json::json;
use surrealdb::Connection;
use uuid::Uuid;

use super::validated_json;
use crate::error::ApiError;
use crate::gate::{CurrentUser, session_auth, success};
use crate::state::AppState;

pub fn router<C: Connection>(state: AppState<C>) -> Router {
    Router::new()
        .route("/ads", get(list_ads::<C>).post(create_ad::<C>))
        .route(
            "/ads/{adId}",
            get(get_ad::<C>).put(update_ad::<C>).delete(delete_ad::<C>),
        )
        .route("/ads/{adId}/bids", post(create_bid::<C>))
        .route("/bids", get(list_bids::<C>))
        .route(
            "/bids/{bidId}",
            get(get_bid::<C>).patch(update_bid::<C>).delete(delete_bid::<C>),
        )
        .route("/catalogue", post(upsert_catalogue::<C>).patch(upsert_catalogue::<C>))
        .route_layer(from_fn_with_state(state.clone(), session_auth::<C>))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CreateAdRequest {
    title: String,
    description: String,
    category: String,
    location: serde_json::Value,
    price: i64,
    images: Option<Vec<String>>,
    documents: Option<Vec<String>>,
}

/// POST /api/ads — create an ad owned by the caller.
async fn create_ad<C: Connection>(
    State(state): State<AppState<C>>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<CreateAdRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let req = validated_json(body)?;

    for (field, value) in [
        ("title", &req.title),
        ("description", &req.description),
        ("category", &req.category),
    ] {
        if value.trim().is_empty() {
            return Err(ApiError::Validation(format!("{field} is required")));
        }
    }

    let images = req.images.unwrap_or_default();
    let documents = req.documents.unwrap_or_default();
    if images.len() > MAX_AD_IMAGES {
        return Err(ApiError::Validation(format!(
            "you can only upload up to {MAX_AD_IMAGES} images"
        )));
    }
    if documents.len() > MAX_AD_DOCUMENTS {
        return Err(ApiError::Validation(format!(
            "you can only upload up to {MAX_AD_DOCUMENTS} documents"
        )));
    }

    let ad = state
        .ads
        .create_ad(CreateServiceAd {
            title: req.title,
            owner_id: Some(user.id),
            owner_name: format!("{} {}", user.name, user.surname).trim().to_string(),
            description: req.description,
            category: req.category,
            location: req.location,
            price: req.price,
            images,
            documents,
        })
        .await?;

    Ok(success(json!({
        "message": "Ad created successfully",
        "adId": ad.id,
        "ad": ad,
    })))
}

/// GET /api/ads
async fn list_ads<C: Connection>(
    State(state): State<AppState<C>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let ads = state.ads.list_ads().await?;
    Ok(success(json!({ "data": ads })))
}

/// GET /api/ads/{adId}
async fn get_ad<C: Connection>(
    State(state): State<AppState<C>>,
    Path(ad_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let ad = state.ads.get_ad(ad_id).await?;
    Ok(success(json!({ "data": ad })))
}

/// PUT /api/ads/{adId}
async fn update_ad<C: Connection>(
    State(state): State<AppState<C>>,
    Path(ad_id): Path<Uuid>,
    body: Result<Json<UpdateServiceAd>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let update = validated_json(body)?;

    if let Some(ref images) = update.images {
        if images.len() > MAX_AD_IMAGES {
            return Err(ApiError::Validation(format!(
                "you can only upload up to {MAX_AD_IMAGES} images"
            )));
        }
    }
    if let Some(ref documents) = update.documents {
        if documents.len() > MAX_AD_DOCUMENTS {
            return Err(ApiError::Validation(format!(
                "you can only upload up to {MAX_AD_DOCUMENTS} documents"
            )));
        }
    }

    let ad = state.ads.update_ad(ad_id, update).await?;
    Ok(success(json!({ "message": "Ad updated successfully", "ad": ad })))
}

/// DELETE /api/ads/{adId}
async fn delete_ad<C: Connection>(
    State(state): State<AppState<C>>,
    Path(ad_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.ads.get_ad(ad_id).await?;
    state.ads.delete_ad(ad_id).await?;
    Ok(success(json!({ "message": "Ad deleted successfully" })))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CreateBidRequest {
    amount: i64,
    message: Option<String>,
}

/// POST /api/ads/{adId}/bids — place a bid on an ad.
async fn create_bid<C: Connection>(
    State(state): State<AppState<C>>,
    CurrentUser(user): CurrentUser,
    Path(ad_id): Path<Uuid>,
    body: Result<Json<CreateBidRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let req = validated_json(body)?;

    if req.amount <= 0 {
        return Err(ApiError::Validation("amount must be positive".into()));
    }

    // The ad must exist and still be open for bidding.
    let ad = state.ads.get_ad(ad_id).await?;
    if ad.status != AdStatus::Open {
        return Err(ApiError::Validation("this ad is closed for bidding".into()));
    }

    let bid = state
        .ads
        .create_bid(CreateAdBid {
            ad_id,
            bidder_id: user.id,
            bidder_name: format!("{} {}", user.name, user.surname).trim().to_string(),
            amount: req.amount,
            message: req.message,
        })
        .await?;

    Ok(success(json!({ "bid": bid })))
}

#[derive(Debug, Deserialize)]
struct BidListQuery {
    #[serde(rename = "adId")]
    ad_id: Option<Uuid>,
}

/// GET /api/bids — all bids, optionally narrowed to one ad.
async fn list_bids<C: Connection>(
    State(state): State<AppState<C>>,
    Query(query): Query<BidListQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let bids = state.ads.list_bids(query.ad_id).await?;
    Ok(success(json!({ "data": bids })))
}

/// GET /api/bids/{bidId}
async fn get_bid<C: Connection>(
    State(state): State<AppState<C>>,
    Path(bid_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let bid = state.ads.get_bid(bid_id).await?;
    Ok(success(json!({ "data": bid })))
}

/// PATCH /api/bids/{bidId}
async fn update_bid<C: Connection>(
    State(state): State<AppState<C>>,
    Path(bid_id): Path<Uuid>,
    body: Result<Json<UpdateAdBid>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let update = validated_json(body)?;
    let bid = state.ads.update_bid(bid_id, update).await?;
    Ok(success(json!({ "bid": bid })))
}

/// DELETE /api/bids/{bidId}
async fn delete_bid<C: Connection>(
    State(state): State<AppState<C>>,
    Path(bid_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.ads.get_bid(bid_id).await?;
    state.ads.delete_bid(bid_id).await?;
    Ok(success(json!({ "message": "Bid deleted successfully" })))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogueRequest {
    services: Vec<String>,
}

/// POST|PATCH /api/catalogue — create or replace the caller's service
/// catalogue.
async fn upsert_catalogue<C: Connection>(
    State(state): State<AppState<C>>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<CatalogueRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let req = validated_json(body)?;

    if req.services.is_empty() {
        return Err(ApiError::Validation("services must not be empty".into()));
    }

    let catalogue = state.ads.upsert_catalogue(user.id, req.services).await?;
    Ok(success(json!({ "catalogue": catalogue })))
}

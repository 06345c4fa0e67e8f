//! Rental application routes. All routes require federated
//! authentication.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use rentora_core::models::application::{ApplicationStatus, CreateApplication, RentalApplication};
use rentora_core::models::user::UserRole;
use rentora_core::repository::{ApplicationRepository, PropertyRepository};
use serde::{Deserialize, Serialize};
use serde_json::json;
use surrealdb::Connection;
use uuid::Uuid;

use super::{PageInfo, page_params, validated_json};
use crate::error::ApiError;
use crate::gate::{CurrentUser, federated_auth, success};
use crate::state::AppState;

pub fn router<C: Connection>(state: AppState<C>) -> Router {
    Router::new()
        .route(
            "/",
            get(list_applications::<C>).post(create_application::<C>),
        )
        .route("/{applicationId}/status", put(update_status::<C>))
        .route_layer(from_fn_with_state(state.clone(), federated_auth::<C>))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct ApplicationPayload {
    #[serde(flatten)]
    application: RentalApplication,
    property: Option<serde_json::Value>,
}

async fn with_property<C: Connection>(
    state: &AppState<C>,
    application: RentalApplication,
) -> ApplicationPayload {
    let property = state
        .properties
        .get_by_id(application.property_id)
        .await
        .ok()
        .and_then(|p| serde_json::to_value(p).ok());
    ApplicationPayload {
        application,
        property,
    }
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    status: Option<ApplicationStatus>,
    page: Option<u64>,
    limit: Option<u64>,
}

/// GET /api/applications — the caller's own applications.
async fn list_applications<C: Connection>(
    State(state): State<AppState<C>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (pagination, page, limit) = page_params(query.page, query.limit);

    let result = state
        .applications
        .list_by_tenant(user.id, query.status, pagination)
        .await?;

    let total = result.total;
    let mut payloads = Vec::with_capacity(result.items.len());
    for application in result.items {
        payloads.push(with_property(&state, application).await);
    }

    Ok(success(json!({
        "applications": payloads,
        "pagination": PageInfo::new(page, limit, total),
    })))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CreateApplicationRequest {
    #[serde(rename = "propertyId")]
    property_id: Uuid,
    #[serde(rename = "moveInDate")]
    move_in_date: Option<DateTime<Utc>>,
    message: Option<String>,
    documents: Option<serde_json::Value>,
}

/// POST /api/applications — apply for a property.
async fn create_application<C: Connection>(
    State(state): State<AppState<C>>,
    CurrentUser(user): CurrentUser,
    body: Result<Json<CreateApplicationRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let req = validated_json(body)?;

    // The referenced property must exist before any write.
    state.properties.get_by_id(req.property_id).await?;

    let application = state
        .applications
        .create(CreateApplication {
            property_id: req.property_id,
            tenant_id: user.id,
            move_in_date: req.move_in_date,
            message: req.message,
            documents: req.documents,
        })
        .await?;

    Ok(success(json!({
        "application": with_property(&state, application).await,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UpdateStatusRequest {
    status: ApplicationStatus,
    message: Option<String>,
}

/// PUT /api/applications/{applicationId}/status — landlord of the
/// property or admin.
async fn update_status<C: Connection>(
    State(state): State<AppState<C>>,
    CurrentUser(user): CurrentUser,
    Path(application_id): Path<Uuid>,
    body: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let req = validated_json(body)?;

    let application = state.applications.get_by_id(application_id).await?;
    let property = state.properties.get_by_id(application.property_id).await?;

    if property.landlord_id != user.id && user.role != UserRole::Admin {
        return Err(ApiError::InsufficientPermissions(
            "only the property's landlord or an admin may update application status".into(),
        ));
    }

    let updated = state
        .applications
        .update_status(application_id, req.status, req.message)
        .await?;

    Ok(success(json!({
        "application": with_property(&state, updated).await,
    })))
}

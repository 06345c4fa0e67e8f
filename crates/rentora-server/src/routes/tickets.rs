//! Support ticket routes: lifecycle, messages, statistics, and
//! configuration listings.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use rentora_core::models::ticket::{
    CreateTicket, CreateTicketMessage, TicketFilters, TicketPriority, TicketStatus, UpdateTicket,
};
use rentora_core::repository::TicketRepository;
use serde::Deserialize;
use serde_json::json;
use surrealdb::Connection;
use uuid::Uuid;

use super::{PageInfo, page_params, validated_json};
use crate::error::ApiError;
use crate::gate::success;
use crate::state::AppState;

pub fn router<C: Connection>(state: AppState<C>) -> Router {
    Router::new()
        .route("/", get(list_tickets::<C>).post(create_ticket::<C>))
        .route("/stats", get(statistics::<C>))
        .route("/statuses", get(list_statuses))
        .route("/priorities", get(list_priorities))
        .route("/categories", get(list_categories))
        .route(
            "/{id}",
            get(get_ticket::<C>)
                .put(update_ticket::<C>)
                .delete(delete_ticket::<C>),
        )
        .route("/{id}/close", post(close_ticket::<C>))
        .route("/{id}/reopen", post(reopen_ticket::<C>))
        .route("/{id}/escalate", post(escalate_ticket::<C>))
        .route("/{id}/messages", get(list_messages::<C>).post(add_message::<C>))
        .with_state(state)
}

/// Known ticket categories exposed to the support console.
const CATEGORIES: &[&str] = &["general", "billing", "technical", "account", "property"];

fn parse_status_list(raw: &str) -> Result<Vec<TicketStatus>, ApiError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            serde_json::from_value(serde_json::Value::String(s.to_string()))
                .map_err(|_| ApiError::Validation(format!("unknown ticket status: {s}")))
        })
        .collect()
}

fn parse_priority_list(raw: &str) -> Result<Vec<TicketPriority>, ApiError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            serde_json::from_value(serde_json::Value::String(s.to_string()))
                .map_err(|_| ApiError::Validation(format!("unknown ticket priority: {s}")))
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct TicketListQuery {
    page: Option<u64>,
    limit: Option<u64>,
    /// Comma-separated status list.
    status: Option<String>,
    /// Comma-separated priority list.
    priority: Option<String>,
    category: Option<String>,
    search: Option<String>,
}

/// GET /api/tickets — filtered, paginated listing.
async fn list_tickets<C: Connection>(
    State(state): State<AppState<C>>,
    Query(query): Query<TicketListQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (pagination, page, limit) = page_params(query.page, query.limit);

    let filters = TicketFilters {
        status: query
            .status
            .as_deref()
            .map(parse_status_list)
            .transpose()?
            .unwrap_or_default(),
        priority: query
            .priority
            .as_deref()
            .map(parse_priority_list)
            .transpose()?
            .unwrap_or_default(),
        category: query.category,
        search: query.search,
    };

    let result = state.tickets.list(filters, pagination).await?;
    let info = PageInfo::new(page, limit, result.total);
    let has_next = page < info.total_pages;

    Ok(success(json!({
        "data": result.items,
        "pagination": {
            "page": info.page,
            "limit": info.limit,
            "total": info.total,
            "totalPages": info.total_pages,
            "hasNext": has_next,
            "hasPrev": page > 1,
        },
    })))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CreateTicketRequest {
    subject: String,
    description: String,
    priority: TicketPriority,
    category: String,
    #[serde(rename = "customerEmail")]
    customer_email: String,
    #[serde(rename = "customerName")]
    customer_name: String,
    tags: Option<Vec<String>>,
}

/// POST /api/tickets — open a ticket; assigns the next ticket number
/// and an SLA due date from the priority.
async fn create_ticket<C: Connection>(
    State(state): State<AppState<C>>,
    body: Result<Json<CreateTicketRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let req = validated_json(body)?;

    if req.subject.trim().is_empty() || req.description.trim().is_empty() {
        return Err(ApiError::Validation(
            "subject and description are required".into(),
        ));
    }
    if req.customer_email.trim().is_empty() {
        return Err(ApiError::Validation("customerEmail is required".into()));
    }

    let ticket = state
        .tickets
        .create(CreateTicket {
            subject: req.subject,
            description: req.description,
            priority: req.priority,
            category: req.category,
            customer_email: req.customer_email,
            customer_name: req.customer_name,
            tags: req.tags.unwrap_or_default(),
        })
        .await?;

    Ok(success(json!({ "ticket": ticket })))
}

/// GET /api/tickets/{id}
async fn get_ticket<C: Connection>(
    State(state): State<AppState<C>>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let ticket = state.tickets.get_by_id(id).await?;
    let messages = state.tickets.list_messages(id).await?;

    Ok(success(json!({ "ticket": ticket, "messages": messages })))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UpdateTicketRequest {
    subject: Option<String>,
    description: Option<String>,
    status: Option<TicketStatus>,
    priority: Option<TicketPriority>,
    category: Option<String>,
    #[serde(rename = "assignedTo")]
    assigned_to: Option<Option<String>>,
    tags: Option<Vec<String>>,
}

/// PUT /api/tickets/{id}
async fn update_ticket<C: Connection>(
    State(state): State<AppState<C>>,
    Path(id): Path<Uuid>,
    body: Result<Json<UpdateTicketRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let req = validated_json(body)?;

    let ticket = state
        .tickets
        .update(
            id,
            UpdateTicket {
                subject: req.subject,
                description: req.description,
                status: req.status,
                priority: req.priority,
                category: req.category,
                assigned_to: req.assigned_to,
                tags: req.tags,
            },
        )
        .await?;

    Ok(success(json!({ "ticket": ticket })))
}

/// DELETE /api/tickets/{id}
async fn delete_ticket<C: Connection>(
    State(state): State<AppState<C>>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.tickets.get_by_id(id).await?;
    state.tickets.delete(id).await?;

    Ok(success(json!({ "message": "Ticket deleted" })))
}

async fn close_ticket<C: Connection>(
    State(state): State<AppState<C>>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let ticket = state.tickets.set_status(id, TicketStatus::Closed).await?;
    Ok(success(json!({ "ticket": ticket })))
}

async fn reopen_ticket<C: Connection>(
    State(state): State<AppState<C>>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let ticket = state.tickets.set_status(id, TicketStatus::Open).await?;
    Ok(success(json!({ "ticket": ticket })))
}

async fn escalate_ticket<C: Connection>(
    State(state): State<AppState<C>>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let ticket = state.tickets.set_status(id, TicketStatus::Escalated).await?;
    Ok(success(json!({ "ticket": ticket })))
}

/// GET /api/tickets/{id}/messages
async fn list_messages<C: Connection>(
    State(state): State<AppState<C>>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.tickets.get_by_id(id).await?;
    let messages = state.tickets.list_messages(id).await?;

    Ok(success(json!({ "messages": messages })))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AddMessageRequest {
    author: String,
    body: String,
    internal: Option<bool>,
}

/// POST /api/tickets/{id}/messages
async fn add_message<C: Connection>(
    State(state): State<AppState<C>>,
    Path(id): Path<Uuid>,
    body: Result<Json<AddMessageRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let req = validated_json(body)?;

    if req.body.trim().is_empty() {
        return Err(ApiError::Validation("message body is required".into()));
    }

    state.tickets.get_by_id(id).await?;

    let message = state
        .tickets
        .add_message(CreateTicketMessage {
            ticket_id: id,
            author: req.author,
            body: req.body,
            internal: req.internal.unwrap_or(false),
        })
        .await?;

    Ok(success(json!({ "message": message })))
}

/// GET /api/tickets/stats
async fn statistics<C: Connection>(
    State(state): State<AppState<C>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let stats = state.tickets.statistics().await?;
    Ok(success(json!({ "stats": stats })))
}

/// GET /api/tickets/statuses
async fn list_statuses() -> Json<serde_json::Value> {
    let statuses: Vec<&str> = TicketStatus::all().iter().map(|s| s.as_str()).collect();
    success(json!({ "statuses": statuses }))
}

/// GET /api/tickets/priorities
async fn list_priorities() -> Json<serde_json::Value> {
    let priorities: Vec<&str> = TicketPriority::all().iter().map(|p| p.as_str()).collect();
    success(json!({ "priorities": priorities }))
}

/// GET /api/tickets/categories
async fn list_categories() -> Json<serde_json::Value> {
    success(json!({ "categories": CATEGORIES }))
}

//! Rentora Server — Axum HTTP surface for the property-rental
//! marketplace.

pub mod config;
pub mod error;
pub mod gate;
pub mod mail;
pub mod routes;
pub mod state;

use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use surrealdb::Connection;

pub use config::ServerConfig;
pub use state::AppState;

/// Assemble the full application router.
pub fn app<C: Connection>(state: AppState<C>) -> Router {
    let api = Router::new()
        .nest("/auth", routes::auth::router(state.clone()))
        .nest("/mobile", routes::mobile::router(state.clone()))
        .nest("/properties", routes::properties::router(state.clone()))
        .nest("/applications", routes::applications::router(state.clone()))
        .nest("/tickets", routes::tickets::router(state.clone()))
        .nest("/settings", routes::settings::router(state.clone()))
        .nest("/admin", routes::admin::router(state.clone()))
        .merge(routes::ads::router(state));

    Router::new().route("/", get(root)).nest("/api", api)
}

/// GET / — service banner.
async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "service": "rentora-api",
        "status": "ok",
    }))
}

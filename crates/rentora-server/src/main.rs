//! Rentora Server — application entry point.

use std::sync::Arc;

use anyhow::Context;
use rentora_auth::identity::FederatedVerifier;
use rentora_db::DbManager;
use rentora_server::{AppState, ServerConfig, app};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("rentora=info".parse().unwrap()),
        )
        .json()
        .init();

    let config = ServerConfig::from_env().context("loading configuration")?;

    let db = DbManager::connect(&config.db)
        .await
        .context("connecting to SurrealDB")?;
    rentora_db::run_migrations(db.client())
        .await
        .context("running migrations")?;

    let provider = Arc::new(FederatedVerifier::new(config.federated_project_id.clone()));
    let state = AppState::new(db.client().clone(), provider, config.auth_config());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    tracing::info!(%addr, "Rentora server listening");

    axum::serve(listener, app(state))
        .await
        .context("serving HTTP")?;

    Ok(())
}

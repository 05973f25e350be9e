//! vecrag API Server
//!
//! REST API server embedding text items into Qdrant and searching them.
//!
//! Author: hephaex@gmail.com

use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use vecrag_api::{create_router, state::AppState};
use vecrag_core::{AppConfig, LoggingConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the environment may be set directly
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    init_tracing(&config.logging);

    // Create application state
    let state = Arc::new(AppState::from_config(&config)?);

    if !state.auth_enabled() {
        tracing::warn!("AUTH_TOKEN is not set: /upsert and /search are open to anyone");
    }

    // Provisioning is lazy per request; a failure here is not fatal
    if let Err(e) = state.service.init().await {
        tracing::warn!(error = %e, "Could not ensure collection at startup");
    }

    // Create router
    let app = create_router(state.clone());

    // Start server
    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        collection = state.service.collection(),
        "vecrag API server starting on http://{}",
        addr
    );
    tracing::info!("OpenAPI document at http://{}/openapi.json", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{},tower_http=debug", logging.level))
    });

    if logging.json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

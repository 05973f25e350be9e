//! vecrag API - REST server
//!
//! Exposes `/health`, `/upsert` and `/search` over the retrieval service,
//! with shared-secret bearer auth on the last two.
//!
//! Author: hephaex@gmail.com

pub mod auth;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::Router;
use state::AppState;
use std::sync::Arc;

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    routes::app_routes(state)
}

/// Router over in-memory adapters, for integration tests
///
/// `auth_token` plays the role of `AUTH_TOKEN`; `None` leaves the API open.
#[cfg(feature = "test-utils")]
pub fn create_router_for_testing(auth_token: Option<&str>) -> Router {
    create_router(Arc::new(testing_state(auth_token)))
}

/// Application state over a hashing embedder and an in-memory store
#[cfg(feature = "test-utils")]
pub fn testing_state(auth_token: Option<&str>) -> AppState {
    use vecrag_core::{Secret, ServerConfig};
    use vecrag_rag::RetrievalService;
    use vecrag_vector::testing::{HashingEmbedding, InMemoryStore};

    const TEST_DIMENSION: usize = 256;

    let service = RetrievalService::new(
        Arc::new(HashingEmbedding::new(TEST_DIMENSION)),
        Arc::new(InMemoryStore::new("test", TEST_DIMENSION)),
    );
    let server = ServerConfig {
        auth_token: auth_token.map(Secret::new),
        ..ServerConfig::default()
    };

    AppState::new(service, server)
}

//! API route definitions
//!
//! Author: hephaex@gmail.com

use crate::auth::require_bearer;
use crate::handlers::{health, search, upsert};
use crate::openapi::api_doc;
use crate::state::AppState;
use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa_swagger_ui::SwaggerUi;

/// Routes that require the shared secret (when one is configured)
pub fn protected_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/upsert", post(upsert::upsert_handler))
        .route("/search", post(search::search_handler))
        .route_layer(middleware::from_fn_with_state(state, require_bearer))
}

/// Build the full application router
pub fn app_routes(state: Arc<AppState>) -> Router {
    let docs = SwaggerUi::new("/swagger-ui").url("/openapi.json", api_doc(&state.server));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(protected_routes(state.clone()))
        .merge(docs)
        .layer(cors_layer(&state.server.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the configured origins; any origin when none are configured.
///
/// Invalid entries are skipped, so a list with no valid origin allows none.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

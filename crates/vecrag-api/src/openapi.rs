//! OpenAPI document
//!
//! Author: hephaex@gmail.com

use crate::error::ApiError;
use crate::handlers::{health, search, upsert};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::openapi::server::Server;
use utoipa::{Modify, OpenApi};
use vecrag_core::ServerConfig;

#[derive(OpenApi)]
#[openapi(
    info(title = "vecrag", description = "Embed, store and search text items in Qdrant"),
    paths(
        health::health_check,
        upsert::upsert_handler,
        search::search_handler,
    ),
    components(schemas(
        health::HealthResponse,
        upsert::UpsertRequest,
        upsert::ItemInput,
        upsert::UpsertResponse,
        search::SearchRequest,
        search::SearchResponse,
        search::ChunkResponse,
        ApiError,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Liveness"),
        (name = "items", description = "Ingestion and similarity search")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

/// OpenAPI document advertising the configured public URL, if any
pub fn api_doc(server: &ServerConfig) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    if let Some(url) = &server.public_url {
        doc.servers = Some(vec![Server::new(url)]);
    }
    doc
}

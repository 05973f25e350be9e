//! Similarity search handler
//!
//! Author: hephaex@gmail.com

use crate::error::AppError;
use crate::extract::ValidatedJson;
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};
use vecrag_core::RetrievedChunk;
use vecrag_rag::DEFAULT_TOP_K;

/// Search request body
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SearchRequest {
    /// Query text
    #[validate(custom(function = "not_blank"))]
    #[schema(example = "heart health")]
    pub query: String,

    /// Maximum number of results
    #[serde(default = "default_top_k")]
    #[validate(range(min = 1))]
    #[schema(example = 5, default = 5, minimum = 1)]
    pub top_k: usize,

    /// Minimum similarity score for a hit to be returned
    #[schema(example = 0.3)]
    pub score_threshold: Option<f32>,
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("query cannot be empty".into());
        return Err(err);
    }
    Ok(())
}

/// A retrieved chunk
#[derive(Debug, Serialize, ToSchema)]
pub struct ChunkResponse {
    pub id: String,

    #[schema(example = "omega-3 benefits heart health")]
    pub text: String,

    #[schema(example = 0.87)]
    pub score: f32,

    /// Payload entries other than `text`
    #[schema(value_type = Object)]
    pub metadata: Map<String, Value>,
}

impl From<RetrievedChunk> for ChunkResponse {
    fn from(chunk: RetrievedChunk) -> Self {
        Self {
            id: chunk.id,
            text: chunk.text,
            score: chunk.score,
            metadata: chunk.metadata.into_map(),
        }
    }
}

/// Search response body
#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResponse {
    /// The query as received
    pub query: String,

    /// Hits ordered by descending score
    pub results: Vec<ChunkResponse>,
}

/// Search stored items by similarity
#[utoipa::path(
    post,
    path = "/search",
    tag = "items",
    request_body = SearchRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Search results", body = SearchResponse),
        (status = 401, description = "Missing bearer token"),
        (status = 403, description = "Invalid token"),
        (status = 422, description = "Invalid request", body = crate::error::ApiError),
        (status = 502, description = "Embedding provider or vector store failed", body = crate::error::ApiError)
    )
)]
pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<SearchRequest>,
) -> Result<impl IntoResponse, AppError> {
    let results = state
        .service
        .query(&req.query, req.top_k, req.score_threshold)
        .await?;

    Ok(Json(SearchResponse {
        query: req.query,
        results: results.into_iter().map(ChunkResponse::from).collect(),
    }))
}

//! Ingestion handler
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
use validator::Validate;
use vecrag_core::{Item, Metadata};

/// Upsert request body
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpsertRequest {
    /// Items to embed and store
    #[validate(length(min = 1, message = "must contain at least one item"))]
    pub items: Vec<ItemInput>,
}

/// A text item to store
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ItemInput {
    /// UUID or unsigned integer; derived from the text when omitted
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Option<String>,

    #[schema(example = "omega-3 benefits heart health")]
    pub text: String,

    /// Arbitrary metadata; the `text` key is reserved
    #[schema(value_type = Option<Object>, example = json!({"source": "doc1"}))]
    pub metadata: Option<Map<String, Value>>,
}

impl From<ItemInput> for Item {
    fn from(input: ItemInput) -> Self {
        Item {
            id: input.id,
            text: input.text,
            metadata: input.metadata.map(Metadata::from),
        }
    }
}

/// Upsert response body
#[derive(Debug, Serialize, ToSchema)]
pub struct UpsertResponse {
    /// Resolved point ids, in request order
    pub upserted: Vec<String>,
}

/// Embed and store items
#[utoipa::path(
    post,
    path = "/upsert",
    tag = "items",
    request_body = UpsertRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Items stored", body = UpsertResponse),
        (status = 401, description = "Missing bearer token"),
        (status = 403, description = "Invalid token"),
        (status = 422, description = "Invalid request", body = crate::error::ApiError),
        (status = 502, description = "Embedding provider or vector store failed", body = crate::error::ApiError)
    )
)]
pub async fn upsert_handler(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<UpsertRequest>,
) -> Result<impl IntoResponse, AppError> {
    let items: Vec<Item> = req.items.into_iter().map(Item::from).collect();

    let ids = state.service.ingest(&items).await?;

    Ok(Json(UpsertResponse {
        upserted: ids.iter().map(ToString::to_string).collect(),
    }))
}

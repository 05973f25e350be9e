//! Qdrant implementation for vector storage
//!
//! Provides connection management and point operations against a single,
//! fixed collection.
//!
//! Author: hephaex@gmail.com

use async_trait::async_trait;
use qdrant_client::qdrant::{
    point_id::PointIdOptions, value::Kind, CreateCollectionBuilder, Distance, PointId,
    PointStruct, SearchPointsBuilder, UpsertPointsBuilder, Value as QdrantValue,
    VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::Duration;
use vecrag_core::{PointId as ItemId, RagError, Result, SearchHit, StoreConfig, StoredPoint};

/// Qdrant vector store implementation
pub struct QdrantStore {
    client: Qdrant,
    collection: String,
    dimension: usize,
}

impl QdrantStore {
    /// Create a new Qdrant connection
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let mut builder =
            Qdrant::from_url(&config.url).timeout(Duration::from_secs(config.timeout_secs));

        if let Some(api_key) = &config.api_key {
            builder = builder.api_key(api_key.expose().to_string());
        }

        let client = builder
            .build()
            .map_err(|e| RagError::Store(format!("Qdrant connection failed: {e}")))?;

        Ok(Self {
            client,
            collection: config.collection.clone(),
            dimension: config.vector_dimension,
        })
    }
}

#[async_trait]
impl super::VectorStore for QdrantStore {
    async fn ensure_collection(&self) -> Result<()> {
        let collections = self
            .client
            .list_collections()
            .await
            .map_err(|e| RagError::Store(format!("Failed to list collections: {e}")))?;

        let exists = collections
            .collections
            .iter()
            .any(|c| c.name == self.collection);

        if !exists {
            tracing::info!(
                collection = %self.collection,
                dimension = self.dimension,
                "Creating Qdrant collection"
            );
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.collection).vectors_config(
                        VectorParamsBuilder::new(self.dimension as u64, Distance::Cosine),
                    ),
                )
                .await
                .map_err(|e| RagError::Store(format!("Failed to create collection: {e}")))?;
        }

        Ok(())
    }

    async fn upsert(&self, points: Vec<StoredPoint>) -> Result<()> {
        let points: Vec<PointStruct> = points
            .into_iter()
            .map(|p| PointStruct::new(to_qdrant_id(p.id), p.vector, payload_to_qdrant(p.payload)))
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
            .await
            .map_err(|e| RagError::Store(format!("Failed to upsert points: {e}")))?;

        Ok(())
    }

    async fn search(
        &self,
        query_vector: &[f32],
        limit: usize,
        score_threshold: Option<f32>,
    ) -> Result<Vec<SearchHit>> {
        let mut builder =
            SearchPointsBuilder::new(&self.collection, query_vector.to_vec(), limit as u64)
                .with_payload(true);

        if let Some(threshold) = score_threshold {
            builder = builder.score_threshold(threshold);
        }

        let results = self
            .client
            .search_points(builder)
            .await
            .map_err(|e| RagError::Store(format!("Vector search failed: {e}")))?;

        Ok(results
            .result
            .into_iter()
            .map(|point| SearchHit {
                id: point.id.as_ref().map(point_id_to_string).unwrap_or_default(),
                score: point.score,
                payload: payload_from_qdrant(point.payload),
            })
            .collect())
    }

    fn collection(&self) -> &str {
        &self.collection
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

// ============================================================================
// Conversions
// ============================================================================

fn to_qdrant_id(id: ItemId) -> PointId {
    match id {
        ItemId::Uuid(uuid) => PointId::from(uuid.to_string()),
        ItemId::Num(n) => PointId::from(n),
    }
}

fn point_id_to_string(id: &PointId) -> String {
    match &id.point_id_options {
        Some(PointIdOptions::Uuid(uuid)) => uuid.clone(),
        Some(PointIdOptions::Num(n)) => n.to_string(),
        None => String::new(),
    }
}

fn payload_to_qdrant(payload: Map<String, Value>) -> HashMap<String, QdrantValue> {
    payload.into_iter().map(|(k, v)| (k, v.into())).collect()
}

fn payload_from_qdrant(payload: HashMap<String, QdrantValue>) -> Map<String, Value> {
    payload
        .into_iter()
        .map(|(k, v)| (k, qdrant_value_to_json(v)))
        .collect()
}

fn qdrant_value_to_json(value: QdrantValue) -> Value {
    match value.kind {
        None | Some(Kind::NullValue(_)) => Value::Null,
        Some(Kind::BoolValue(b)) => Value::Bool(b),
        Some(Kind::IntegerValue(i)) => Value::from(i),
        Some(Kind::DoubleValue(f)) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Some(Kind::StringValue(s)) => Value::String(s),
        Some(Kind::ListValue(list)) => {
            Value::Array(list.values.into_iter().map(qdrant_value_to_json).collect())
        }
        Some(Kind::StructValue(s)) => Value::Object(
            s.fields
                .into_iter()
                .map(|(k, v)| (k, qdrant_value_to_json(v)))
                .collect(),
        ),
    }
}

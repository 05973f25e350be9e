//! vecrag RAG - Retrieval service
//!
//! Orchestrates the embedding client and the vector store for the two
//! operations the service offers:
//! - `ingest`: resolve ids, embed, upsert
//! - `query`: embed, search, shape hits into chunks
//!
//! Both are single-pass and keep no state between calls; the vector store
//! is the only durable state.
//!
//! Author: hephaex@gmail.com

use std::sync::Arc;
use std::time::Instant;
use vecrag_core::{AppConfig, Item, PointId, RagError, Result, RetrievedChunk, StoredPoint};
use vecrag_vector::{create_embedding_client, EmbeddingClient, QdrantStore, VectorStore};

/// Default number of results for a query
pub const DEFAULT_TOP_K: usize = 5;

/// Retrieval service over an explicit client bundle
#[derive(Clone)]
pub struct RetrievalService {
    embedder: Arc<dyn EmbeddingClient>,
    store: Arc<dyn VectorStore>,
}

impl RetrievalService {
    /// Create a service from already-built adapters
    pub fn new(embedder: Arc<dyn EmbeddingClient>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    /// Build the OpenAI/Ollama embedder and the Qdrant store from config
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        config.validate()?;
        let embedder: Arc<dyn EmbeddingClient> =
            Arc::from(create_embedding_client(&config.embedding)?);
        let store: Arc<dyn VectorStore> = Arc::new(QdrantStore::new(&config.store)?);

        if embedder.dimension() != store.dimension() {
            tracing::warn!(
                model = %config.embedding.model,
                model_dimension = embedder.dimension(),
                collection_dimension = store.dimension(),
                "Embedding model dimension differs from collection dimension"
            );
        }

        Ok(Self::new(embedder, store))
    }

    /// Name of the backing collection
    pub fn collection(&self) -> &str {
        self.store.collection()
    }

    /// Make sure the collection exists
    pub async fn init(&self) -> Result<()> {
        self.store.ensure_collection().await
    }

    /// Embed and upsert items, returning their resolved ids in input order.
    ///
    /// Items without an explicit id get a content-derived one, so the same
    /// text ingested twice overwrites one point. Edited text yields a new id.
    pub async fn ingest(&self, items: &[Item]) -> Result<Vec<PointId>> {
        let ids = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                item.validate()
                    .and_then(|_| item.resolve_id())
                    .map_err(|e| prefix_field(e, &format!("items[{i}]")))
            })
            .collect::<Result<Vec<_>>>()?;

        if items.is_empty() {
            return Ok(ids);
        }

        let start = Instant::now();
        self.store.ensure_collection().await?;

        let texts: Vec<String> = items.iter().map(|item| item.text.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;
        if vectors.len() != items.len() {
            return Err(RagError::Embedding(format!(
                "Expected {} embeddings, got {}",
                items.len(),
                vectors.len()
            )));
        }

        let points = items
            .iter()
            .zip(&ids)
            .zip(vectors)
            .map(|((item, id), vector)| {
                self.check_dimension(&vector)?;
                Ok(StoredPoint::new(*id, vector, &item.text, item.metadata.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        self.store.upsert(points).await?;

        tracing::info!(
            collection = self.store.collection(),
            items = ids.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Upserted items"
        );

        Ok(ids)
    }

    /// Embed a query and return up to `top_k` chunks in store order
    pub async fn query(
        &self,
        text: &str,
        top_k: usize,
        score_threshold: Option<f32>,
    ) -> Result<Vec<RetrievedChunk>> {
        if top_k == 0 {
            return Err(RagError::validation("top_k", "must be at least 1"));
        }
        if score_threshold.is_some_and(|t| !t.is_finite()) {
            return Err(RagError::validation("score_threshold", "must be a finite number"));
        }

        let start = Instant::now();
        self.store.ensure_collection().await?;

        let vector = self.embedder.embed(text).await?;
        self.check_dimension(&vector)?;

        let hits = self.store.search(&vector, top_k, score_threshold).await?;
        let chunks: Vec<RetrievedChunk> = hits.into_iter().map(RetrievedChunk::from).collect();

        tracing::info!(
            collection = self.store.collection(),
            top_k,
            score_threshold,
            results = chunks.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Searched collection"
        );

        Ok(chunks)
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        let expected = self.store.dimension();
        if vector.len() == expected {
            Ok(())
        } else {
            Err(RagError::DimensionMismatch {
                expected,
                actual: vector.len(),
            })
        }
    }
}

/// Qualify a validation error's field with the position of the item
fn prefix_field(err: RagError, prefix: &str) -> RagError {
    match err {
        RagError::Validation { field, message } => RagError::Validation {
            field: format!("{prefix}.{field}"),
            message,
        },
        other => other,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use vecrag_core::Metadata;
    use vecrag_vector::testing::{FailingEmbedding, HashingEmbedding, InMemoryStore};

    const DIM: usize = 256;

    fn service() -> (RetrievalService, Arc<HashingEmbedding>, Arc<InMemoryStore>) {
        let embedder = Arc::new(HashingEmbedding::new(DIM));
        let store = Arc::new(InMemoryStore::new("test", DIM));
        let service = RetrievalService::new(embedder.clone(), store.clone());
        (service, embedder, store)
    }

    #[tokio::test]
    async fn test_ingest_returns_ids_in_input_order() {
        let (service, embedder, store) = service();
        let items = vec![
            Item::new("first"),
            Item::new("second").with_id("42"),
            Item::new("third"),
        ];

        let ids = service.ingest(&items).await.unwrap();

        assert_eq!(ids.len(), 3);
        assert_eq!(ids[0], PointId::from_content("first"));
        assert_eq!(ids[1], PointId::Num(42));
        assert_eq!(ids[2], PointId::from_content("third"));
        assert_eq!(embedder.calls(), 3);
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn test_reingesting_same_text_overwrites() {
        let (service, _, store) = service();

        let first = service.ingest(&[Item::new("same text")]).await.unwrap();
        let second = service.ingest(&[Item::new("same text")]).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_edited_text_gets_new_identity_without_explicit_id() {
        let (service, _, store) = service();

        let original = service.ingest(&[Item::new("draft v1")]).await.unwrap();
        let edited = service.ingest(&[Item::new("draft v2")]).await.unwrap();
        assert_ne!(original, edited);
        assert_eq!(store.len(), 2);

        // With an explicit id the edit overwrites instead
        service
            .ingest(&[Item::new("draft v3").with_id(original[0].to_string())])
            .await
            .unwrap();
        assert_eq!(store.len(), 2);
        let payload = store.payload(&original[0].to_string()).unwrap();
        assert_eq!(payload["text"], json!("draft v3"));
    }

    #[tokio::test]
    async fn test_ingest_empty_is_noop() {
        let (service, embedder, store) = service();
        let ids = service.ingest(&[]).await.unwrap();
        assert!(ids.is_empty());
        assert_eq!(embedder.calls(), 0);
        assert_eq!(store.ensure_calls(), 0);
    }

    #[tokio::test]
    async fn test_ingest_rejects_invalid_items_before_embedding() {
        let (service, embedder, _) = service();

        let err = service
            .ingest(&[Item::new("ok"), Item::new("bad").with_id("doc-1")])
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::Validation { ref field, .. } if field == "items[1].id"));

        let reserved: Metadata = [("text", "shadow")].into_iter().collect();
        let err = service
            .ingest(&[Item::new("x").with_metadata(reserved)])
            .await
            .unwrap_err();
        assert!(
            matches!(err, RagError::Validation { ref field, .. } if field == "items[0].metadata.text")
        );
        assert_eq!(embedder.calls(), 0);
    }

    #[tokio::test]
    async fn test_roundtrip_query_returns_text_unchanged() {
        let (service, _, _) = service();
        service
            .ingest(&[
                Item::new("omega-3 benefits heart health"),
                Item::new("vitamin d supports bones"),
            ])
            .await
            .unwrap();

        let results = service.query("heart health", 1, None).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].text, "omega-3 benefits heart health");
        assert_eq!(
            results[0].id,
            PointId::from_content("omega-3 benefits heart health").to_string()
        );
    }

    #[tokio::test]
    async fn test_metadata_roundtrip() {
        let (service, _, _) = service();
        let metadata: Metadata = [("source", json!("doc1")), ("year", json!(2024))]
            .into_iter()
            .collect();
        service
            .ingest(&[Item::new("x").with_metadata(metadata)])
            .await
            .unwrap();

        let results = service.query("x", 5, None).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].text, "x");
        assert_eq!(results[0].metadata.get("source"), Some(&json!("doc1")));
        assert_eq!(results[0].metadata.get("year"), Some(&json!(2024)));
        assert!(results[0].metadata.get("text").is_none());
    }

    #[tokio::test]
    async fn test_query_respects_top_k_and_threshold() {
        let (service, _, _) = service();
        let items: Vec<Item> = (0..10)
            .map(|i| Item::new(format!("fish oil note number {i}")))
            .chain([Item::new("completely unrelated gardening tips")])
            .collect();
        service.ingest(&items).await.unwrap();

        let results = service.query("fish oil", 3, None).await.unwrap();
        assert_eq!(results.len(), 3);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));

        let results = service.query("fish oil", 20, Some(0.5)).await.unwrap();
        assert!(!results.is_empty());
        assert!(results.iter().all(|r| r.score >= 0.5));
        assert!(results.iter().all(|r| r.text.starts_with("fish oil")));
    }

    #[tokio::test]
    async fn test_query_validates_arguments() {
        let (service, embedder, _) = service();
        assert!(matches!(
            service.query("q", 0, None).await,
            Err(RagError::Validation { .. })
        ));
        assert!(matches!(
            service.query("q", 1, Some(f32::NAN)).await,
            Err(RagError::Validation { .. })
        ));
        assert_eq!(embedder.calls(), 0);
    }

    #[tokio::test]
    async fn test_query_on_fresh_collection_creates_it() {
        let (service, _, store) = service();
        let results = service.query("anything", 5, None).await.unwrap();
        assert!(results.is_empty());
        assert_eq!(store.ensure_calls(), 1);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_hard_failure() {
        let embedder = Arc::new(HashingEmbedding::new(32));
        let store = Arc::new(InMemoryStore::new("test", DIM));
        let service = RetrievalService::new(embedder, store.clone());

        let err = service.ingest(&[Item::new("x")]).await.unwrap_err();
        assert!(matches!(
            err,
            RagError::DimensionMismatch {
                expected: DIM,
                actual: 32
            }
        ));
        assert!(store.is_empty());
        assert!(service.query("x", 1, None).await.unwrap_err().is_upstream());
    }

    #[tokio::test]
    async fn test_embedding_failure_propagates() {
        let store = Arc::new(InMemoryStore::new("test", DIM));
        let service = RetrievalService::new(Arc::new(FailingEmbedding::new(DIM)), store.clone());

        let err = service.ingest(&[Item::new("x")]).await.unwrap_err();
        assert!(matches!(err, RagError::Embedding(_)));
        assert!(store.is_empty());

        let err = service.query("x", 1, None).await.unwrap_err();
        assert!(matches!(err, RagError::Embedding(_)));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_identical_text_ingests_to_one_point(text in "[a-z ]{1,40}", repeats in 1usize..4) {
            let (service, _, store) = service();
            let mut seen = Vec::new();
            for _ in 0..repeats {
                let ids = tokio_test::block_on(service.ingest(&[Item::new(text.clone())])).unwrap();
                seen.push(ids[0]);
            }
            prop_assert!(seen.windows(2).all(|w| w[0] == w[1]));
            prop_assert_eq!(store.len(), 1);
        }

        #[test]
        fn prop_results_never_exceed_top_k(count in 0usize..12, top_k in 1usize..8) {
            let (service, _, _) = service();
            let items: Vec<Item> = (0..count).map(|i| Item::new(format!("doc {i}"))).collect();
            tokio_test::block_on(service.ingest(&items)).unwrap();
            let results = tokio_test::block_on(service.query("doc", top_k, None)).unwrap();
            prop_assert!(results.len() <= top_k);
            prop_assert_eq!(results.len(), count.min(top_k));
        }
    }
}

//! vecrag Vector - Embedding and vector database adapters
//!
//! Provides the two external collaborators of the retrieval service:
//! an embedding client that turns text into vectors, and a vector store
//! (Qdrant) that keeps points and answers similarity searches.
//!
//! Author: hephaex@gmail.com

use async_trait::async_trait;
use vecrag_core::{Result, SearchHit, StoredPoint};

pub mod embedding;
pub mod qdrant_store;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use embedding::{create_embedding_client, EmbeddingClient, OllamaEmbedding, OpenAiEmbedding};
pub use qdrant_store::QdrantStore;

/// Trait for vector database operations
///
/// Implementations never retry; every failure is returned as-is.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create the configured collection if it does not exist yet.
    ///
    /// Must be idempotent and cheap enough to call on every request.
    async fn ensure_collection(&self) -> Result<()>;

    /// Insert or overwrite points by id
    async fn upsert(&self, points: Vec<StoredPoint>) -> Result<()>;

    /// Return up to `limit` hits ordered by descending cosine similarity,
    /// dropping hits scored below `score_threshold` when given.
    async fn search(
        &self,
        query_vector: &[f32],
        limit: usize,
        score_threshold: Option<f32>,
    ) -> Result<Vec<SearchHit>>;

    /// Name of the collection this store writes to
    fn collection(&self) -> &str;

    /// Vector dimension of the collection
    fn dimension(&self) -> usize;
}

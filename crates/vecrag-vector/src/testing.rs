//! In-memory adapters for tests
//!
//! `HashingEmbedding` produces deterministic bag-of-words vectors, so texts
//! sharing words score higher than unrelated ones. `InMemoryStore` answers
//! searches by brute-force cosine similarity and mirrors the store errors
//! the service has to handle.
//!
//! Author: hephaex@gmail.com

use crate::{EmbeddingClient, VectorStore};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;
use vecrag_core::{RagError, Result, SearchHit, StoredPoint};

// ============================================================================
// Hashing embedder
// ============================================================================

/// Deterministic embedder that hashes lowercase words into buckets
pub struct HashingEmbedding {
    dimension: usize,
    calls: AtomicUsize,
}

impl HashingEmbedding {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of provider calls made so far (one per text)
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn bucket(&self, word: &str) -> usize {
        // FNV-1a
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in word.bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        (hash % self.dimension as u64) as usize
    }
}

#[async_trait]
impl EmbeddingClient for HashingEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let mut vector = vec![0.0f32; self.dimension];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            vector[self.bucket(&word.to_lowercase())] += 1.0;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Embedder whose provider is always unavailable
pub struct FailingEmbedding {
    dimension: usize,
}

impl FailingEmbedding {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl EmbeddingClient for FailingEmbedding {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RagError::Embedding(
            "Embedding request failed: connection refused".to_string(),
        ))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Brute-force cosine store keeping points in insertion order
pub struct InMemoryStore {
    collection: String,
    dimension: usize,
    created: AtomicBool,
    ensure_calls: AtomicUsize,
    points: RwLock<Vec<(String, Vec<f32>, Map<String, Value>)>>,
}

impl InMemoryStore {
    pub fn new(collection: impl Into<String>, dimension: usize) -> Self {
        Self {
            collection: collection.into(),
            dimension,
            created: AtomicBool::new(false),
            ensure_calls: AtomicUsize::new(0),
            points: RwLock::new(Vec::new()),
        }
    }

    /// Number of stored points
    pub fn len(&self) -> usize {
        self.points.read().map(|p| p.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// How many times `ensure_collection` ran
    pub fn ensure_calls(&self) -> usize {
        self.ensure_calls.load(Ordering::SeqCst)
    }

    /// Stored payload for a point id
    pub fn payload(&self, id: &str) -> Option<Map<String, Value>> {
        self.points
            .read()
            .ok()?
            .iter()
            .find(|(pid, _, _)| pid == id)
            .map(|(_, _, payload)| payload.clone())
    }

    fn check_collection(&self) -> Result<()> {
        if self.created.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RagError::Store(format!(
                "Collection `{}` doesn't exist!",
                self.collection
            )))
        }
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn ensure_collection(&self) -> Result<()> {
        self.ensure_calls.fetch_add(1, Ordering::SeqCst);
        self.created.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn upsert(&self, points: Vec<StoredPoint>) -> Result<()> {
        self.check_collection()?;
        if let Some(bad) = points.iter().find(|p| p.vector.len() != self.dimension) {
            return Err(RagError::Store(format!(
                "Wrong input: Vector dimension error: expected dim: {}, got {}",
                self.dimension,
                bad.vector.len()
            )));
        }

        let mut stored = self
            .points
            .write()
            .map_err(|_| RagError::Store("store lock poisoned".to_string()))?;
        for point in points {
            let id = point.id.to_string();
            match stored.iter_mut().find(|(pid, _, _)| *pid == id) {
                Some(existing) => *existing = (id, point.vector, point.payload),
                None => stored.push((id, point.vector, point.payload)),
            }
        }
        Ok(())
    }

    async fn search(
        &self,
        query_vector: &[f32],
        limit: usize,
        score_threshold: Option<f32>,
    ) -> Result<Vec<SearchHit>> {
        self.check_collection()?;
        if query_vector.len() != self.dimension {
            return Err(RagError::Store(format!(
                "Wrong input: Vector dimension error: expected dim: {}, got {}",
                self.dimension,
                query_vector.len()
            )));
        }

        let stored = self
            .points
            .read()
            .map_err(|_| RagError::Store("store lock poisoned".to_string()))?;

        let mut hits: Vec<SearchHit> = stored
            .iter()
            .map(|(id, vector, payload)| SearchHit {
                id: id.clone(),
                score: cosine(query_vector, vector),
                payload: payload.clone(),
            })
            .filter(|hit| score_threshold.map_or(true, |t| hit.score >= t))
            .collect();

        // Stable sort keeps insertion order among equal scores
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit);
        Ok(hits)
    }

    fn collection(&self) -> &str {
        &self.collection
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

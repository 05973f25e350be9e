//! Data model shared by the adapters, the retrieval service and the API
//!
//! Author: hephaex@gmail.com

use crate::{RagError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Point identifiers
// ============================================================================

/// Namespace for content-derived point ids (UUID v5)
const CONTENT_ID_NAMESPACE: Uuid = Uuid::from_u128(0x3c2e_9a4f_7d1b_5e08_a6f4_1b9d_0c7e_52a3);

/// Identifier of a stored point
///
/// The vector store only accepts UUIDs and unsigned integers, so arbitrary
/// strings are rejected at parse time instead of failing inside the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointId {
    Uuid(Uuid),
    Num(u64),
}

impl PointId {
    /// Derive a deterministic id from item text.
    ///
    /// Identical bytes always map to the same id; any edit to the text maps
    /// to a different one.
    pub fn from_content(text: &str) -> Self {
        Self::Uuid(Uuid::new_v5(&CONTENT_ID_NAMESPACE, text.as_bytes()))
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uuid(id) => write!(f, "{}", id.hyphenated()),
            Self::Num(n) => write!(f, "{n}"),
        }
    }
}

impl FromStr for PointId {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = s.parse::<u64>() {
                return Ok(Self::Num(n));
            }
        }
        Uuid::parse_str(s).map(Self::Uuid).map_err(|_| {
            RagError::validation("id", "must be a UUID or an unsigned 64-bit integer")
        })
    }
}

impl From<Uuid> for PointId {
    fn from(id: Uuid) -> Self {
        Self::Uuid(id)
    }
}

impl From<u64> for PointId {
    fn from(n: u64) -> Self {
        Self::Num(n)
    }
}

// ============================================================================
// Metadata
// ============================================================================

/// Caller-supplied metadata attached to an item
///
/// The key `text` is reserved: the service stores the item text under it in
/// the point payload, so metadata may not use it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(Map<String, Value>);

impl Metadata {
    /// Payload key holding the item text
    pub const RESERVED_TEXT_KEY: &'static str = "text";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the caller tried to use the reserved `text` key
    pub fn uses_reserved_key(&self) -> bool {
        self.0.contains_key(Self::RESERVED_TEXT_KEY)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Build a point payload: the item text under the reserved key plus
    /// every metadata entry.
    pub fn into_payload(self, text: &str) -> Map<String, Value> {
        let mut payload = self.0;
        payload.insert(
            Self::RESERVED_TEXT_KEY.to_string(),
            Value::String(text.to_string()),
        );
        payload
    }

    /// Split a stored payload back into `(text, metadata)`.
    ///
    /// A missing `text` entry yields an empty string. A non-string one is
    /// left in the metadata so nothing stored is dropped.
    pub fn split_payload(mut payload: Map<String, Value>) -> (String, Self) {
        let text = match payload.remove(Self::RESERVED_TEXT_KEY) {
            Some(Value::String(s)) => s,
            Some(other) => {
                payload.insert(Self::RESERVED_TEXT_KEY.to_string(), other);
                String::new()
            }
            None => String::new(),
        };
        (text, Self(payload))
    }
}

impl From<Map<String, Value>> for Metadata {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

// ============================================================================
// Items and points
// ============================================================================

/// A text item submitted for ingestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Explicit point id; derived from `text` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl Item {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: None,
            text: text.into(),
            metadata: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Resolve the point id: the explicit id when given, otherwise the
    /// content-derived one. A blank id counts as absent.
    pub fn resolve_id(&self) -> Result<PointId> {
        match self.id.as_deref().filter(|id| !id.trim().is_empty()) {
            Some(id) => id.parse(),
            None => Ok(PointId::from_content(&self.text)),
        }
    }

    /// Check the item can be stored without losing data
    pub fn validate(&self) -> Result<()> {
        self.resolve_id()?;
        if self
            .metadata
            .as_ref()
            .is_some_and(Metadata::uses_reserved_key)
        {
            return Err(RagError::validation(
                "metadata.text",
                "the `text` key is reserved for the item text",
            ));
        }
        Ok(())
    }
}

/// A point ready to be written to the vector store
#[derive(Debug, Clone, PartialEq)]
pub struct StoredPoint {
    pub id: PointId,
    pub vector: Vec<f32>,
    pub payload: Map<String, Value>,
}

impl StoredPoint {
    pub fn new(id: PointId, vector: Vec<f32>, text: &str, metadata: Option<Metadata>) -> Self {
        Self {
            id,
            vector,
            payload: metadata.unwrap_or_default().into_payload(text),
        }
    }
}

/// A raw hit returned by the vector store
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: String,
    pub score: f32,
    pub payload: Map<String, Value>,
}

/// A search result shaped for callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub id: String,
    pub text: String,
    pub score: f32,
    pub metadata: Metadata,
}

impl From<SearchHit> for RetrievedChunk {
    fn from(hit: SearchHit) -> Self {
        let (text, metadata) = Metadata::split_payload(hit.payload);
        Self {
            id: hit.id,
            text,
            score: hit.score,
            metadata,
        }
    }
}

//! vecrag Core - Domain models, errors, and configuration
//!
//! This crate defines the shared vocabulary of the vecrag service:
//! - Items, stored points, search hits and retrieved chunks
//! - Point identifiers (explicit or content-derived)
//! - The reserved-key metadata map
//! - Common error types
//! - Configuration management
//!
//! Author: hephaex@gmail.com

pub mod config;
pub mod model;

pub use config::{
    AppConfig, ConfigError, EmbeddingConfig, EmbeddingProvider, LoggingConfig, Secret,
    ServerConfig, StoreConfig,
};
pub use model::{Item, Metadata, PointId, RetrievedChunk, SearchHit, StoredPoint};

use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for vecrag operations
///
/// Every variant except `Validation` and `Config` describes a failure of an
/// external collaborator (embedding provider or vector store). None of them
/// are retried.
#[derive(Error, Debug)]
pub enum RagError {
    #[error("Validation error: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Embedding unavailable: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    Store(String),

    #[error("Embedding dimension mismatch: collection expects {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RagError {
    /// Build a validation error for a named request field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether the error originated in an external service
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::Embedding(_) | Self::Store(_) | Self::DimensionMismatch { .. }
        )
    }
}

impl From<ConfigError> for RagError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RagError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_classification() {
        assert!(RagError::Embedding("quota".into()).is_upstream());
        assert!(RagError::Store("down".into()).is_upstream());
        assert!(RagError::DimensionMismatch {
            expected: 1536,
            actual: 768
        }
        .is_upstream());
        assert!(!RagError::validation("query", "empty").is_upstream());
        assert!(!RagError::Config("missing".into()).is_upstream());
    }

    #[test]
    fn test_validation_message_names_field() {
        let err = RagError::validation("items[0].id", "must be a UUID or unsigned integer");
        assert_eq!(
            err.to_string(),
            "Validation error: items[0].id: must be a UUID or unsigned integer"
        );
    }
}

//! vecrag Configuration Management
//!
//! Handles configuration from environment variables and TOML files with
//! sensible defaults for development. The loaded `AppConfig` is passed
//! explicitly to whatever builds the clients; nothing here is global.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Vector store connection
    pub store: StoreConfig,

    /// Embedding provider configuration
    pub embedding: EmbeddingConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        self.apply_env()?;
        Ok(self)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        // Server
        if let Some(host) = env_var("API_HOST") {
            self.server.host = host;
        }
        if let Some(port) = env_var("API_PORT") {
            self.server.port = parse_var("API_PORT", port)?;
        }
        if let Some(token) = auth_token(std::env::var("AUTH_TOKEN").ok()) {
            self.server.auth_token = Some(token);
        }
        if let Some(url) = env_var("PUBLIC_URL") {
            self.server.public_url = Some(url);
        }

        // CORS origins from environment variable (comma-separated)
        if let Some(origins) = env_var("CORS_ORIGINS") {
            self.server.cors_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Qdrant
        if let Some(url) = env_var("QDRANT_URL") {
            self.store.url = url;
        }
        if let Some(key) = env_var("QDRANT_API_KEY") {
            self.store.api_key = Some(Secret::new(key));
        }
        if let Some(collection) = env_var("QDRANT_COLLECTION") {
            self.store.collection = collection;
        }
        if let Some(timeout) = env_var("QDRANT_TIMEOUT_SECS") {
            self.store.timeout_secs = parse_var("QDRANT_TIMEOUT_SECS", timeout)?;
        }
        if let Some(dimension) = env_var("VECTOR_DIMENSION") {
            self.store.vector_dimension = parse_var("VECTOR_DIMENSION", dimension)?;
        }

        // Embedding
        if let Some(provider) = env_var("EMBEDDING_PROVIDER") {
            self.embedding.provider = provider.parse()?;
        }
        if let Some(key) = env_var("OPENAI_API_KEY") {
            self.embedding.openai_api_key = Some(Secret::new(key));
        }
        if let Some(url) = env_var("OPENAI_BASE_URL") {
            self.embedding.openai_base_url = url;
        }
        if let Some(url) = env_var("OLLAMA_URL") {
            self.embedding.ollama_url = url;
        }
        if let Some(model) = env_var("EMBEDDING_MODEL") {
            self.embedding.model = model;
        }

        // Logging
        if let Some(level) = env_var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = env_var("LOG_FORMAT") {
            self.logging.json_format = format.eq_ignore_ascii_case("json");
        }

        Ok(())
    }

    /// Check cross-field constraints before any client is built
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.collection.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "QDRANT_COLLECTION".to_string(),
                value: self.store.collection.clone(),
            });
        }
        if self.store.vector_dimension == 0 {
            return Err(ConfigError::InvalidValue {
                key: "VECTOR_DIMENSION".to_string(),
                value: "0".to_string(),
            });
        }
        if self.embedding.provider == EmbeddingProvider::OpenAI
            && self.embedding.openai_api_key.is_none()
        {
            return Err(ConfigError::MissingRequired("OPENAI_API_KEY".to_string()));
        }
        Ok(())
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Only an empty value disables auth; a whitespace-only secret stays in force
fn auth_token(value: Option<String>) -> Option<Secret> {
    value.filter(|v| !v.is_empty()).map(Secret::new)
}

fn parse_var<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

/// A credential that never shows up in `Debug` output or logs
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Shared bearer secret; `None` leaves the API open
    pub auth_token: Option<Secret>,

    /// Allowed origins for CORS (empty allows any origin)
    pub cors_origins: Vec<String>,

    /// Server URL advertised in the OpenAPI document
    pub public_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            auth_token: None,
            cors_origins: vec![],
            public_url: None,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Vector store connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Qdrant gRPC URL
    pub url: String,

    /// Qdrant API key
    pub api_key: Option<Secret>,

    /// Collection name
    pub collection: String,

    /// Client timeout in seconds
    pub timeout_secs: u64,

    /// Vector dimension (must match embedding model)
    pub vector_dimension: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6334".to_string(),
            api_key: None,
            collection: "omega3-QD".to_string(),
            timeout_secs: 30,
            vector_dimension: 1536, // OpenAI text-embedding-3-small
        }
    }
}

/// Embedding provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Embedding provider to use
    pub provider: EmbeddingProvider,

    /// OpenAI API key
    pub openai_api_key: Option<Secret>,

    /// OpenAI API base URL (for compatible APIs)
    pub openai_base_url: String,

    /// Ollama server URL
    pub ollama_url: String,

    /// Embedding model name
    pub model: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::OpenAI,
            openai_api_key: None,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            ollama_url: "http://localhost:11434".to_string(),
            model: "text-embedding-3-small".to_string(),
        }
    }
}

/// Supported embedding providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    OpenAI,
    Ollama,
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "ollama" => Ok(Self::Ollama),
            _ => Err(ConfigError::InvalidValue {
                key: "EMBEDDING_PROVIDER".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.store.vector_dimension, 1536);
        assert_eq!(config.store.collection, "omega3-QD");
        assert_eq!(config.embedding.model, "text-embedding-3-small");
        assert!(config.server.auth_token.is_none());
    }

    #[test]
    fn test_embedding_provider_parse() {
        assert_eq!(
            "openai".parse::<EmbeddingProvider>().unwrap(),
            EmbeddingProvider::OpenAI
        );
        assert_eq!(
            "Ollama".parse::<EmbeddingProvider>().unwrap(),
            EmbeddingProvider::Ollama
        );
        assert!("invalid".parse::<EmbeddingProvider>().is_err());
    }

    #[test]
    fn test_secret_is_redacted() {
        let mut config = AppConfig::default();
        config.server.auth_token = Some(Secret::new("hunter2"));
        config.embedding.openai_api_key = Some(Secret::new("sk-live"));

        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("sk-live"));
        assert!(rendered.contains("Secret(***)"));
    }

    #[test]
    fn test_blank_auth_token_keeps_auth_enabled() {
        assert!(auth_token(None).is_none());
        assert!(auth_token(Some(String::new())).is_none());

        let token = auth_token(Some("  ".to_string())).unwrap();
        assert_eq!(token.expose(), "  ");
        assert_eq!(auth_token(Some("secret".to_string())).unwrap().expose(), "secret");
    }

    #[test]
    fn test_validate_requires_openai_key() {
        let config = AppConfig::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingRequired(ref k)) if k == "OPENAI_API_KEY"
        ));

        let mut config = AppConfig::default();
        config.embedding.provider = EmbeddingProvider::Ollama;
        assert!(config.validate().is_ok());

        config.store.vector_dimension = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [store]
            collection = "notes"
            vector_dimension = 768

            [embedding]
            provider = "ollama"
            model = "nomic-embed-text"
            "#,
        )
        .unwrap();

        assert_eq!(config.store.collection, "notes");
        assert_eq!(config.store.vector_dimension, 768);
        assert_eq!(config.store.url, "http://localhost:6334");
        assert_eq!(config.embedding.provider, EmbeddingProvider::Ollama);
        assert_eq!(config.server.port, 8080);
    }
}

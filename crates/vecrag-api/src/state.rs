//! Application state management
//!
//! Author: hephaex@gmail.com

use crate::auth::AuthToken;
use vecrag_core::{AppConfig, Result, ServerConfig};
use vecrag_rag::RetrievalService;

/// Application state shared across handlers
///
/// Built once at startup from explicit configuration; handlers only read it.
pub struct AppState {
    /// Retrieval service over the embedding and store clients
    pub service: RetrievalService,
    /// Shared secret for protected routes; `None` disables auth
    pub auth: Option<AuthToken>,
    /// Server configuration (CORS, advertised URL)
    pub server: ServerConfig,
}

impl AppState {
    /// Create new application state
    pub fn new(service: RetrievalService, server: ServerConfig) -> Self {
        let auth = server
            .auth_token
            .as_ref()
            .map(|token| AuthToken::new(token.expose()));

        Self {
            service,
            auth,
            server,
        }
    }

    /// Wire the real embedding and Qdrant clients from config
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let service = RetrievalService::from_config(config)?;
        Ok(Self::new(service, config.server.clone()))
    }

    /// Whether protected routes require a bearer token
    pub fn auth_enabled(&self) -> bool {
        self.auth.is_some()
    }
}

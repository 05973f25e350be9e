//! Shared-secret bearer authentication
//!
//! Protected routes compare the `Authorization: Bearer <token>` header with
//! the configured `AUTH_TOKEN`. When no token is configured every request
//! passes; the server logs a warning at startup in that case.
//!
//! Tokens are never logged.
//!
//! Author: hephaex@gmail.com

use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use thiserror::Error;

/// The configured shared secret, kept only as a SHA-256 digest
#[derive(Clone)]
pub struct AuthToken {
    digest: [u8; 32],
}

impl AuthToken {
    pub fn new(token: &str) -> Self {
        Self {
            digest: Sha256::digest(token.as_bytes()).into(),
        }
    }

    /// Compare a presented token with the secret.
    ///
    /// Both sides are hashed first so the comparison time does not depend
    /// on how much of the secret was guessed.
    pub fn matches(&self, candidate: &str) -> bool {
        let candidate: [u8; 32] = Sha256::digest(candidate.as_bytes()).into();
        candidate
            .iter()
            .zip(self.digest.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

/// Authentication middleware errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Bearer token")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = match self {
            AuthError::MissingToken => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AuthError::InvalidToken => (StatusCode::FORBIDDEN, "FORBIDDEN"),
        };

        let body = serde_json::json!({
            "code": code,
            "message": self.to_string(),
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Extract the bearer token from a raw `Authorization` header value
fn bearer_token(header_value: &str) -> Option<&str> {
    header_value.strip_prefix("Bearer ").map(str::trim)
}

/// Authentication middleware for the protected routes
///
/// - no token configured: pass through
/// - header missing, not UTF-8, or not `Bearer ...`: 401
/// - token does not match: 403
pub async fn require_bearer(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let Some(expected) = state.auth.as_ref() else {
        return Ok(next.run(request).await);
    };

    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(bearer_token);

    let Some(token) = token else {
        tracing::warn!(path = %request.uri().path(), "Rejected request without bearer token");
        return Err(AuthError::MissingToken);
    };

    if !expected.matches(token) {
        tracing::warn!(path = %request.uri().path(), "Rejected request with invalid token");
        return Err(AuthError::InvalidToken);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_matching() {
        let token = AuthToken::new("secret");
        assert!(token.matches("secret"));
        assert!(!token.matches("wrong"));
        assert!(!token.matches(""));
        assert!(!token.matches("secret "));
    }

    #[test]
    fn test_bearer_parsing() {
        assert_eq!(bearer_token("Bearer secret"), Some("secret"));
        assert_eq!(bearer_token("Bearer  secret "), Some("secret"));
        assert_eq!(bearer_token("Bearer "), Some(""));
        assert_eq!(bearer_token("Basic c2VjcmV0"), None);
        assert_eq!(bearer_token("bearer secret"), None);
        assert_eq!(bearer_token(""), None);
    }

    #[test]
    fn test_debug_hides_digest() {
        assert_eq!(format!("{:?}", AuthToken::new("secret")), "AuthToken(***)");
    }

    #[test]
    fn test_error_statuses() {
        assert_eq!(
            AuthError::MissingToken.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::InvalidToken.into_response().status(),
            StatusCode::FORBIDDEN
        );
    }
}

//! API error handling
//!
//! Author: hephaex@gmail.com

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;
use validator::ValidationErrors;
use vecrag_core::RagError;

/// API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Error code
    #[schema(example = "VALIDATION_ERROR")]
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<Value>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    pub fn validation() -> Self {
        Self::new("VALIDATION_ERROR", "Request validation failed")
    }

    pub fn upstream() -> Self {
        Self::new("UPSTREAM_ERROR", "Upstream service failed")
    }

    pub fn internal_error() -> Self {
        Self::new("INTERNAL_ERROR", "Internal server error")
    }
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Body could not be read or parsed at all
    BadRequest { status: StatusCode, message: String },
    /// Body parsed but broke a field rule; details map field -> errors
    Validation(Value),
    /// Embedding provider or vector store failed
    Upstream(String),
    Internal(String),
}

impl AppError {
    /// Validation failure for a single field
    pub fn field(field: &str, code: &str, message: impl Into<String>) -> Self {
        let mut details = serde_json::Map::new();
        details.insert(
            field.to_string(),
            json!([{ "code": code, "message": message.into() }]),
        );
        AppError::Validation(Value::Object(details))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::BadRequest { status, message } => (status, ApiError::bad_request(message)),
            AppError::Validation(details) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::validation().with_details(details),
            ),
            AppError::Upstream(msg) => {
                tracing::error!(error = %msg, "Upstream call failed");
                (StatusCode::BAD_GATEWAY, ApiError::upstream())
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::internal_error(),
                )
            }
        };

        (status, Json(error)).into_response()
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let details = errors
            .field_errors()
            .iter()
            .map(|(field, errors)| {
                let messages: Vec<Value> = errors
                    .iter()
                    .map(|err| {
                        json!({
                            "code": err.code,
                            "message": err.message,
                        })
                    })
                    .collect();
                (field.to_string(), Value::Array(messages))
            })
            .collect::<serde_json::Map<_, _>>();

        AppError::Validation(Value::Object(details))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<RagError> for AppError {
    fn from(err: RagError) -> Self {
        match err {
            RagError::Validation { field, message } => AppError::field(&field, "invalid", message),
            err @ (RagError::Embedding(_)
            | RagError::Store(_)
            | RagError::DimensionMismatch { .. }) => AppError::Upstream(err.to_string()),
            RagError::Config(msg) => AppError::Internal(format!("Configuration error: {msg}")),
            RagError::Other(err) => AppError::Internal(err.to_string()),
        }
    }
}

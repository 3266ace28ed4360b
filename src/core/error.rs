//! Error type system for Libretto
//!
//! This module provides the error taxonomy used across the backend with:
//! - HTTP status code mapping
//! - Structured details for business-rule rejections
//! - Error messages with trace IDs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Main error type for the Libretto backend
#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    // System-level errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task error: {0}")]
    TaskError(String),

    // Request-level errors
    #[error("{0}")]
    ValidationError(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// A domain invariant rejected the operation (stock exhausted, debt
    /// ceiling, already issued, already returned). `details` carries the
    /// computed figures for debt-related rejections.
    #[error("{message}")]
    BusinessRule {
        message: String,
        details: Option<serde_json::Value>,
    },

    // External catalog errors
    #[error("Upstream catalog error: {0}")]
    UpstreamError(String),
}

impl LibraryError {
    /// Shorthand for a business-rule rejection without figures
    pub fn business_rule(message: impl Into<String>) -> Self {
        LibraryError::BusinessRule {
            message: message.into(),
            details: None,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            LibraryError::ValidationError(_) | LibraryError::BusinessRule { .. } => {
                StatusCode::BAD_REQUEST
            }

            // 404 Not Found
            LibraryError::NotFound(_) => StatusCode::NOT_FOUND,

            // 409 Conflict
            LibraryError::Conflict(_) => StatusCode::CONFLICT,

            // 500 Internal Server Error
            LibraryError::ConfigError(_)
            | LibraryError::DatabaseError(_)
            | LibraryError::IoError(_)
            | LibraryError::TaskError(_)
            | LibraryError::UpstreamError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type name for API responses
    pub fn error_type(&self) -> &'static str {
        match self {
            LibraryError::ConfigError(_) => "ConfigError",
            LibraryError::DatabaseError(_) => "DatabaseError",
            LibraryError::IoError(_) => "IoError",
            LibraryError::TaskError(_) => "TaskError",
            LibraryError::ValidationError(_) => "ValidationError",
            LibraryError::NotFound(_) => "NotFound",
            LibraryError::Conflict(_) => "Conflict",
            LibraryError::BusinessRule { .. } => "BusinessRule",
            LibraryError::UpstreamError(_) => "UpstreamError",
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            LibraryError::BusinessRule { details, .. } => details.clone(),
            _ => None,
        }
    }
}

/// Error response structure for API endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error type identifier
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Unique trace ID for this error
    pub trace_id: String,
}

impl ErrorResponse {
    /// Create a new error response with a generated trace ID
    pub fn new(error: String, message: String) -> Self {
        Self {
            error,
            message,
            details: None,
            trace_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an error response with additional details
    pub fn with_details(error: String, message: String, details: serde_json::Value) -> Self {
        Self {
            error,
            message,
            details: Some(details),
            trace_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an error response from a LibraryError
    pub fn from_error(error: &LibraryError) -> Self {
        Self {
            error: error.error_type().to_string(),
            message: error.to_string(),
            details: error.details(),
            trace_id: Uuid::new_v4().to_string(),
        }
    }
}

/// Implement IntoResponse for LibraryError to enable automatic error handling in Axum
impl IntoResponse for LibraryError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let error_response = ErrorResponse::from_error(&self);

        tracing::error!(
            error_type = self.error_type(),
            trace_id = %error_response.trace_id,
            status_code = %status_code,
            "Request failed: {}",
            self
        );

        (status_code, Json(error_response)).into_response()
    }
}

/// Result type alias for operations that can fail with LibraryError
pub type Result<T> = std::result::Result<T, LibraryError>;

/// Context extension trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context to an error using a closure
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: std::fmt::Display,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let context_str = context.into();
            LibraryError::TaskError(format!("{}: {}", context_str, e))
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let context_str = f();
            LibraryError::TaskError(format!("{}: {}", context_str, e))
        })
    }
}

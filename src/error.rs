// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type shared by the sync layer and the proxy routes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("You appear to be offline")]
    Offline,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    #[error("Auth provider error: {0}")]
    AuthProvider(String),

    #[error("Operation failed after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Whether the failure is transient connectivity trouble worth retrying.
    ///
    /// Only [`AppError::Network`] qualifies; everything else is fatal to the
    /// current attempt.
    pub fn is_network_error(&self) -> bool {
        matches!(self, AppError::Network(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }

    /// Classify a `reqwest` transport error.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() || err.is_request() {
            AppError::Network(err.to_string())
        } else if err.is_decode() {
            AppError::BadRequest(format!("Unexpected response shape: {}", err))
        } else {
            AppError::Internal(anyhow::Error::new(err))
        }
    }

    /// Map a non-success HTTP status from an upstream service.
    pub fn from_status(status: u16, body: String, what: &str) -> Self {
        match status {
            401 | 403 => AppError::Unauthorized,
            404 => AppError::NotFound(what.to_string()),
            400 | 422 => AppError::BadRequest(body),
            502..=504 => AppError::Network(format!("HTTP {}: {}", status, body)),
            _ => AppError::Backend {
                status,
                message: body,
            },
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::Offline | AppError::Network(_) | AppError::RetriesExhausted { .. } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "upstream_unavailable",
                Some(self.to_string()),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Backend { status, message } => {
                tracing::warn!(status, error = %message, "Backend error");
                (StatusCode::BAD_GATEWAY, "backend_error", None)
            }
            AppError::AuthProvider(msg) => {
                tracing::warn!(error = %msg, "Auth provider error");
                (StatusCode::BAD_GATEWAY, "auth_provider_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers and services
pub type Result<T> = std::result::Result<T, AppError>;

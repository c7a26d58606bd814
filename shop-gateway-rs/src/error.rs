//! Gateway errors and their HTTP mapping
//!
//! Every failure leaves the gateway as a 5xx with `{"error": ..., "kind": ...}`;
//! `kind` tells caller mistakes apart from dependency failures. Upstream
//! details (URLs, transport messages, provider bodies) are logged but never
//! copied into the response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use shop_sdk::ServiceError;
use thiserror::Error;

use crate::validation::ApiValidationError;

pub type Result<T> = std::result::Result<T, GatewayError>;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Search text is missing or blank, or a query parameter is unusable
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Chat request body is missing, malformed or carries no message
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// Recommendations were requested from an empty catalog
    #[error("No products available to recommend")]
    EmptyPool,

    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl From<ApiValidationError> for GatewayError {
    fn from(err: ApiValidationError) -> Self {
        GatewayError::InvalidMessage(err.to_string())
    }
}

/// Error body returned to HTTP callers
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
}

impl GatewayError {
    /// Stable machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::InvalidQuery(_) => "invalid_query",
            GatewayError::InvalidMessage(_) => "invalid_message",
            GatewayError::EmptyPool => "empty_pool",
            GatewayError::Service(err) => err.kind(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::InvalidQuery(_) | GatewayError::InvalidMessage(_) | GatewayError::EmptyPool => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            GatewayError::Service(err) => service_status(err),
        }
    }

    /// Message safe to show to callers
    pub fn public_message(&self) -> String {
        match self {
            GatewayError::InvalidQuery(_) | GatewayError::InvalidMessage(_) | GatewayError::EmptyPool => {
                self.to_string()
            }
            GatewayError::Service(err) => service_message(err),
        }
    }
}

fn service_status(err: &ServiceError) -> StatusCode {
    match err.cause() {
        ServiceError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        ServiceError::UpstreamError { .. } | ServiceError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
        ServiceError::DeadlineExceeded(_) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn service_message(err: &ServiceError) -> String {
    let message = match err.cause() {
        ServiceError::UpstreamUnavailable(_) => "Catalog provider is unavailable".to_string(),
        ServiceError::UpstreamError { status, .. } => {
            format!("Catalog provider returned an error (status {})", status)
        }
        ServiceError::MalformedResponse(_) => "Catalog provider returned an unexpected response".to_string(),
        ServiceError::DeadlineExceeded(_) => "Request deadline exceeded".to_string(),
        ServiceError::Unsupported(_) => "Operation is not supported by the catalog provider".to_string(),
        _ => "Gateway is misconfigured".to_string(),
    };

    match err.attempts() {
        Some(attempts) => format!("{} after {} attempt(s)", message, attempts),
        None => message,
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match self {
            GatewayError::InvalidQuery(_) | GatewayError::InvalidMessage(_) => {
                tracing::warn!(kind = self.kind(), error = %self, "rejected request");
            }
            _ => {
                tracing::error!(kind = self.kind(), status = status.as_u16(), error = %self, "request failed");
            }
        }

        let body = ErrorResponse {
            error: self.public_message(),
            kind: self.kind().to_string(),
        };

        (status, Json(body)).into_response()
    }
}

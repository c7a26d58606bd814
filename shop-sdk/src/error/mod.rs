//! Error handling for the shop SDK
//!
//! This module provides the error taxonomy shared by every upstream
//! integration:
//! - Catalog dependency failures (unavailable, error status, malformed payload)
//! - Resilience outcomes (retries exhausted, deadline exceeded)
//! - Startup and capability failures (configuration, unsupported operation)
//!
//! Errors can carry an [`ErrorContext`] describing which service and endpoint
//! produced them. The context never changes the error's kind.

use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use crate::util::sanitize_for_logging;

pub mod mapping;

/// Result type for shop SDK operations
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Main error type for the shop SDK
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The upstream could not be reached (connect failure, transport timeout)
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The upstream answered with a non-success status
    #[error("Upstream error (status {status}): {message}")]
    UpstreamError { status: u16, message: String },

    /// The upstream payload could not be turned into domain values
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Every attempt allowed by the retry policy failed
    #[error("Retries exhausted after {attempts} attempt(s): {source}")]
    RetryExhausted {
        attempts: u32,
        #[source]
        source: Box<ServiceError>,
    },

    /// A caller-supplied deadline passed before the operation completed
    #[error("Deadline exceeded: {0}")]
    DeadlineExceeded(String),

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The provider does not offer the requested capability
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Errors with additional context
    #[error("{inner}")]
    WithContext {
        inner: Box<ServiceError>,
        context: ErrorContext,
    },
}

impl ServiceError {
    /// Create an upstream-unavailable error
    pub fn upstream_unavailable(message: impl Into<String>) -> Self {
        ServiceError::UpstreamUnavailable(message.into())
    }

    /// Create an upstream error for a non-success status
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        ServiceError::UpstreamError {
            status,
            message: message.into(),
        }
    }

    /// Create a malformed-response error
    pub fn malformed(message: impl Into<String>) -> Self {
        ServiceError::MalformedResponse(message.into())
    }

    /// Wrap the last failure of an exhausted retry loop
    pub fn retry_exhausted(attempts: u32, last: ServiceError) -> Self {
        ServiceError::RetryExhausted {
            attempts,
            source: Box::new(last),
        }
    }

    /// Create a deadline-exceeded error
    pub fn deadline_exceeded(message: impl Into<String>) -> Self {
        ServiceError::DeadlineExceeded(message.into())
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        ServiceError::Configuration(message.into())
    }

    /// Create an unsupported-operation error
    pub fn unsupported(message: impl Into<String>) -> Self {
        ServiceError::Unsupported(message.into())
    }

    /// Add context to an existing error
    pub fn with_context(self, context: ErrorContext) -> Self {
        ServiceError::WithContext {
            inner: Box::new(self),
            context,
        }
    }

    /// Add a single context key/value to an existing error
    pub fn with_context_value(self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        let mut context = ErrorContext::new();
        context.add(key, value);
        self.with_context(context)
    }

    /// The error with every context layer peeled off
    pub fn root(&self) -> &ServiceError {
        match self {
            ServiceError::WithContext { inner, .. } => inner.root(),
            other => other,
        }
    }

    /// Context attached to this error, if any (outermost layer)
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            ServiceError::WithContext { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Stable, machine-readable kind of this error
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::UpstreamUnavailable(_) => "upstream_unavailable",
            ServiceError::UpstreamError { .. } => "upstream_error",
            ServiceError::MalformedResponse(_) => "malformed_response",
            ServiceError::RetryExhausted { .. } => "retry_exhausted",
            ServiceError::DeadlineExceeded(_) => "deadline_exceeded",
            ServiceError::Configuration(_) => "configuration",
            ServiceError::Unsupported(_) => "unsupported",
            ServiceError::WithContext { inner, .. } => inner.kind(),
        }
    }

    /// The failure that caused an exhausted retry loop, or the error itself
    pub fn cause(&self) -> &ServiceError {
        match self.root() {
            ServiceError::RetryExhausted { source, .. } => source.cause(),
            other => other,
        }
    }

    /// Number of attempts made, when the error came out of a retry loop
    pub fn attempts(&self) -> Option<u32> {
        match self.root() {
            ServiceError::RetryExhausted { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }

    /// Get the upstream HTTP status code if available
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ServiceError::UpstreamError { status, .. } => Some(*status),
            ServiceError::RetryExhausted { source, .. } => source.status_code(),
            ServiceError::WithContext { inner, context } => {
                inner.status_code().or(context.status_code)
            }
            _ => None,
        }
    }

    /// Get the service name if available
    pub fn service_name(&self) -> Option<&str> {
        self.context().map(|context| context.service.as_str())
    }

}

/// Error context information
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Service that generated the error
    pub service: String,

    /// When the error was observed
    pub timestamp: chrono::DateTime<chrono::Utc>,

    /// HTTP status code if applicable
    pub status_code: Option<u16>,

    /// Request ID sent upstream, for correlating logs
    pub request_id: Option<String>,

    /// Endpoint that was called
    pub endpoint: Option<String>,

    /// Additional context data
    pub data: HashMap<String, String>,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            service: "unknown".to_string(),
            timestamp: chrono::Utc::now(),
            status_code: None,
            request_id: None,
            endpoint: None,
            data: HashMap::new(),
        }
    }
}

impl ErrorContext {
    /// Create a new error context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new error context for a specific service
    pub fn for_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            ..Self::default()
        }
    }

    /// Add an HTTP status code
    pub fn status_code(mut self, code: u16) -> Self {
        self.status_code = Some(code);
        self
    }

    /// Add a request ID
    pub fn request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    /// Add an endpoint
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Add a context value
    pub fn add<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: fmt::Display,
    {
        self.data.insert(key.into(), value.to_string());
    }

    /// Add a context value and return self (builder pattern)
    pub fn with<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: fmt::Display,
    {
        self.add(key, value);
        self
    }
}

/// Convert reqwest errors to ServiceError
///
/// Transport-level failures become `UpstreamUnavailable`, body decoding
/// failures become `MalformedResponse`. The request URL is dropped and the
/// remaining text redacted, so query-string credentials never end up in an
/// error message or a log line.
impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        let context = ErrorContext::for_service("http_client");
        let err = err.without_url();
        let message = sanitize_for_logging(&err.to_string());

        let service_error = if err.is_timeout() {
            ServiceError::upstream_unavailable(format!("Request timed out: {}", message))
        } else if err.is_connect() {
            ServiceError::upstream_unavailable(format!("Connection error: {}", message))
        } else if err.is_decode() {
            ServiceError::malformed(format!("Response decode error: {}", message))
        } else if let Some(status) = err.status() {
            ServiceError::upstream(status.as_u16(), message)
        } else {
            ServiceError::upstream_unavailable(format!("HTTP transport error: {}", message))
        };

        match err.status() {
            Some(status) => service_error.with_context(context.status_code(status.as_u16())),
            None => service_error.with_context(context),
        }
    }
}

/// Convert serde_json errors to ServiceError
impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::malformed(format!("JSON error: {}", err))
            .with_context(ErrorContext::for_service("json"))
    }
}

//! Error mapping for upstream HTTP responses
//!
//! Each provider reports failures in its own body shape. These functions pull
//! a human-readable message out of the body and normalize the failure to
//! [`ServiceError::UpstreamError`].

use reqwest::StatusCode;
use serde_json::Value;

use super::{ErrorContext, ServiceError};
use crate::util::truncate_string;

/// Longest raw body excerpt kept in an error message
const MAX_BODY_EXCERPT: usize = 100;

/// Map a non-success upstream response to a ServiceError
pub fn map_http_error(status: StatusCode, body: &str, context: &mut ErrorContext) -> ServiceError {
    context.status_code = Some(status.as_u16());

    let message = match serde_json::from_str::<Value>(body) {
        Ok(json) => extract_message(&json).unwrap_or_else(|| status.to_string()),
        Err(_) if body.trim().is_empty() => status.to_string(),
        Err(_) => format!("{}: {}", status, truncate_string(body.trim(), MAX_BODY_EXCERPT)),
    };

    if let Some(kind) = classify_http_error(status) {
        context.add("error_class", kind);
    }

    ServiceError::upstream(status.as_u16(), message)
}

/// Pull an error message out of the JSON shapes the providers use
///
/// - DummyJSON: `{"message": "..."}`
/// - Gemini / OpenAI: `{"error": {"message": "..."}}`
/// - Generic: `{"error": "..."}`
fn extract_message(json: &Value) -> Option<String> {
    if let Some(error) = json.get("error") {
        if let Some(message) = error.get("message").and_then(Value::as_str) {
            return Some(message.to_string());
        }
        if let Some(message) = error.as_str() {
            return Some(message.to_string());
        }
    }

    json.get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Helper function to classify HTTP errors by category
pub fn classify_http_error(status: StatusCode) -> Option<&'static str> {
    match status.as_u16() {
        400 => Some("validation"),
        401 => Some("authentication"),
        403 => Some("authorization"),
        404 => Some("not_found"),
        408 => Some("timeout"),
        429 => Some("rate_limit"),
        500..=599 => Some("server"),
        _ => None,
    }
}

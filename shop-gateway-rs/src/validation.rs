//! Chat input validation
//!
//! Request bodies are size-limited by [`payload_limit_config`]; an oversized
//! body surfaces as a JSON rejection in the chat handler. Chat messages are
//! then stripped of NUL bytes, trimmed and length-checked before they reach
//! the chat responder or the conversation log.

use axum::extract::DefaultBodyLimit;

/// Maximum request payload size (64KB)
pub const MAX_PAYLOAD_SIZE: usize = 64 * 1024;

/// Maximum chat message length in characters
pub const MAX_MESSAGE_CHARS: usize = 4000;

/// Validation error for chat requests
#[derive(Debug, thiserror::Error)]
pub enum ApiValidationError {
    #[error("Invalid request format: {0}")]
    InvalidFormat(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Message too long: {0} characters (max {1})")]
    TooLong(usize, usize),
}

/// Body size limit layer for the router
pub fn payload_limit_config() -> DefaultBodyLimit {
    DefaultBodyLimit::max(MAX_PAYLOAD_SIZE)
}

/// Sanitize a single string value
///
/// NULs go first so whitespace they were hiding is trimmed too.
pub fn sanitize_text(value: &str) -> String {
    value.replace('\u{0000}', "").trim().to_string()
}

/// Validate and sanitize a chat message
///
/// Returns the text to use from here on: trimmed, without NUL bytes and
/// guaranteed non-empty.
pub fn validate_chat_message(message: Option<&str>) -> Result<String, ApiValidationError> {
    let message = message.ok_or_else(|| ApiValidationError::MissingField("message".to_string()))?;
    let sanitized = sanitize_text(message);

    if sanitized.is_empty() {
        return Err(ApiValidationError::InvalidFormat("message must not be empty".to_string()));
    }

    let chars = sanitized.chars().count();
    if chars > MAX_MESSAGE_CHARS {
        return Err(ApiValidationError::TooLong(chars, MAX_MESSAGE_CHARS));
    }

    Ok(sanitized)
}

//! Common utilities for service clients
//!
//! This module provides shared functionality for all service clients: HTTP
//! client construction, request dispatch with request ids, and error
//! response parsing.

use std::fmt;
use std::time::{Duration, Instant};

use reqwest::{header, Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{ErrorContext, Result, ServiceError};
use crate::util::{generate_request_id, sanitize_for_logging, truncate_string};

/// Header carrying the per-call request id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// UserAgent structure for identifying the client to upstream services
#[derive(Debug, Clone)]
pub struct UserAgent {
    /// Application name
    pub app_name: String,

    /// Version string
    pub version: String,

    /// Optional extra info
    pub extra: Option<String>,
}

impl Default for UserAgent {
    fn default() -> Self {
        Self {
            app_name: "shop-gateway".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            extra: Some("shop-sdk".to_string()),
        }
    }
}

impl UserAgent {
    /// Default user agent with a client-specific suffix
    pub fn for_client(client: &str) -> Self {
        Self {
            extra: Some(client.to_string()),
            ..Self::default()
        }
    }
}

impl fmt::Display for UserAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.app_name, self.version)?;

        if let Some(ref extra) = self.extra {
            write!(f, " ({})", extra)?;
        }

        Ok(())
    }
}

/// Build a standard HTTP client with default settings
pub fn build_http_client(user_agent: Option<UserAgent>, timeout: Option<Duration>) -> Result<Client> {
    let mut headers = header::HeaderMap::new();
    let ua = user_agent.unwrap_or_default().to_string();

    headers.insert(
        header::USER_AGENT,
        header::HeaderValue::from_str(&ua)
            .map_err(|e| ServiceError::configuration(format!("Invalid user agent: {}", e)))?,
    );

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(timeout.unwrap_or_else(|| Duration::from_secs(30)))
        .gzip(true)
        .build()
        .map_err(|e| ServiceError::configuration(format!("Failed to build HTTP client: {}", e)))
}

/// Create error context for HTTP requests
pub fn create_error_context(service_name: &str, endpoint: &str, request_id: &str) -> ErrorContext {
    ErrorContext::for_service(service_name)
        .endpoint(endpoint)
        .request_id(request_id)
}

/// Parse error response from HTTP response
pub async fn parse_error_response(mut context: ErrorContext, response: reqwest::Response) -> ServiceError {
    let status = response.status();

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => format!("Failed to read error response: {}", e),
    };

    warn!(
        service = %context.service,
        status = status.as_u16(),
        body = %sanitize_for_logging(&truncate_string(&body, 200)),
        "upstream returned an error status"
    );

    crate::error::mapping::map_http_error(status, &body, &mut context).with_context(context)
}

/// Send a prepared request and decode a JSON body
///
/// `endpoint` is only used for logs and error context. Transport failures,
/// non-success statuses and undecodable bodies are all mapped to
/// [`ServiceError`] with the service name attached.
pub async fn send_json<R>(service_name: &str, endpoint: &str, request: RequestBuilder) -> Result<R>
where
    R: DeserializeOwned,
{
    let request_id = generate_request_id();
    let context = create_error_context(service_name, endpoint, &request_id);
    let start_time = Instant::now();

    debug!(service = service_name, endpoint = %sanitize_for_logging(endpoint), %request_id, "sending upstream request");

    let response = request
        .header(REQUEST_ID_HEADER, request_id.as_str())
        .send()
        .await
        .map_err(|e| ServiceError::from(e).with_context(context.clone()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(parse_error_response(context, response).await);
    }

    let body = response
        .text()
        .await
        .map_err(|e| ServiceError::from(e).with_context(context.clone()))?;

    debug!(
        service = service_name,
        status = status.as_u16(),
        bytes = body.len(),
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "upstream request completed"
    );

    serde_json::from_str::<R>(&body).map_err(|e| {
        ServiceError::malformed(format!(
            "{} returned an unexpected payload: {}",
            service_name, e
        ))
        .with_context(context)
    })
}

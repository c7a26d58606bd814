//! Gemini generateContent client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::TextGenerator;
use crate::config::{GeminiConfig, ServiceConfig};
use crate::error::{Result, ServiceError};
use crate::services::common::{build_http_client, send_json, UserAgent};

const SERVICE_NAME: &str = "gemini";

/// Header carrying the API key, so it stays out of request URLs
pub const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// Request body for `models/{model}:generateContent`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

impl GenerateContentRequest {
    /// A single-turn request carrying one text part
    pub fn from_prompt(prompt: &str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

/// Response body of `generateContent`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate, or "" when absent
    pub fn first_text(&self) -> String {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .and_then(|content| content.parts.first())
            .map(|part| part.text.clone())
            .unwrap_or_default()
    }
}

/// Gemini API client
pub struct GeminiClient {
    http_client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    /// Create a client from a validated configuration
    pub fn new(config: GeminiConfig) -> Result<Self> {
        config.validate()?;
        let http_client = build_http_client(
            Some(UserAgent::for_client("gemini-client")),
            Some(std::time::Duration::from_secs(config.timeout_seconds)),
        )?;

        Ok(Self { http_client, config })
    }

    fn endpoint(&self) -> String {
        format!("/models/{}:generateContent", self.config.model)
    }

    /// Send a generateContent request
    pub async fn generate_content(&self, request: &GenerateContentRequest) -> Result<GenerateContentResponse> {
        let endpoint = self.endpoint();
        let url = url::Url::parse(&format!("{}{}", self.config.base_url, endpoint))
            .map_err(|e| ServiceError::configuration(format!("Invalid Gemini URL: {}", e)))?;

        let request = self
            .http_client
            .post(url)
            .header(API_KEY_HEADER, self.config.api_key.as_str())
            .json(request);

        send_json(SERVICE_NAME, &endpoint, request).await
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn name(&self) -> &'static str {
        SERVICE_NAME
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let response = self.generate_content(&GenerateContentRequest::from_prompt(prompt)).await?;
        let text = response.first_text();

        debug!(model = %self.config.model, chars = text.chars().count(), "Gemini answered");
        Ok(text)
    }
}

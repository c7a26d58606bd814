//! OpenAI-compatible chat completions client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use super::TextGenerator;
use crate::config::{OpenAIConfig, ServiceConfig};
use crate::error::{Result, ServiceError};
use crate::services::common::{build_http_client, send_json, UserAgent};

const SERVICE_NAME: &str = "openai";

/// System prompt sent ahead of every user message
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful shopping assistant for an e-commerce store. Be friendly and helpful.";

/// Chat message role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A chat message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The role of the message author
    pub role: Role,

    /// The content of the message
    pub content: String,
}

/// Chat completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    /// ID of the model to use
    pub model: String,

    /// The messages to generate chat completions for
    pub messages: Vec<ChatMessage>,

    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Sampling temperature (0.0-2.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// A message in a chat completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionMessage {
    pub role: String,

    /// Content of the message; absent for tool calls
    pub content: Option<String>,
}

/// A chat completion choice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionChoice {
    pub index: u32,
    pub message: ChatCompletionMessage,
    pub finish_reason: Option<String>,
}

/// Token usage statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Chat completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub model: String,

    /// Choices generated
    pub choices: Vec<ChatCompletionChoice>,

    /// Token usage statistics
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// OpenAI API client
pub struct OpenAIClient {
    http_client: Client,
    config: OpenAIConfig,
}

impl OpenAIClient {
    /// Create a client from a validated configuration
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        config.validate()?;
        let http_client = build_http_client(
            Some(UserAgent::for_client("openai-client")),
            Some(std::time::Duration::from_secs(config.timeout_seconds)),
        )?;

        Ok(Self { http_client, config })
    }

    /// Send a chat completion request
    pub async fn chat_completion(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse> {
        let url = url::Url::parse(&format!("{}/chat/completions", self.config.base_url))
            .map_err(|e| ServiceError::configuration(format!("Invalid OpenAI URL: {}", e)))?;

        let mut builder = self
            .http_client
            .post(url)
            .bearer_auth(&self.config.api_key)
            .json(request);

        if let Some(ref org) = self.config.org_id {
            builder = builder.header("OpenAI-Organization", org.as_str());
        }

        send_json(SERVICE_NAME, "/chat/completions", builder).await
    }

    /// The request sent for a single user message
    pub fn request_for(&self, message: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: Role::System,
                    content: DEFAULT_SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: Role::User,
                    content: message.to_string(),
                },
            ],
            max_tokens: Some(self.config.max_tokens),
            temperature: None,
        }
    }
}

#[async_trait]
impl TextGenerator for OpenAIClient {
    fn name(&self) -> &'static str {
        SERVICE_NAME
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let response = self.chat_completion(&self.request_for(prompt)).await?;

        if let Some(usage) = &response.usage {
            debug!(model = %response.model, total_tokens = usage.total_tokens, "OpenAI answered");
        }

        Ok(response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default())
    }
}

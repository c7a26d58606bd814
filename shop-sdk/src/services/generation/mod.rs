//! Text generation clients
//!
//! The chat path treats generation as an opaque capability: a prompt goes
//! in, text comes out. [`TextGenerator`] is that capability; Gemini and
//! OpenAI-compatible chat completions implement it.

mod gemini;
mod openai;

pub use gemini::GeminiClient;
pub use openai::{OpenAIClient, DEFAULT_SYSTEM_PROMPT};

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::{ConfigProvider, ConfigProviderExt, GeminiConfig, OpenAIConfig};
use crate::error::{Result, ServiceError};

/// A prompt-in, text-out generation capability
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Provider name used in logs and health output
    fn name(&self) -> &'static str;

    /// Generate a reply for `prompt`
    ///
    /// An answer without text is returned as an empty string rather than an
    /// error; callers decide what a blank answer means.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Which generation provider to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationProvider {
    Gemini,
    OpenAI,
    /// Rule-based replies only
    Disabled,
}

impl FromStr for GenerationProvider {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(GenerationProvider::Gemini),
            "openai" => Ok(GenerationProvider::OpenAI),
            "none" | "disabled" | "off" => Ok(GenerationProvider::Disabled),
            other => Err(ServiceError::configuration(format!("Unknown generation provider: {}", other))),
        }
    }
}

/// Build the configured text generator, if any
///
/// `GENERATION_PROVIDER` picks the provider explicitly. Without it the first
/// provider with a credential wins, Gemini before OpenAI. `Ok(None)` means no
/// generation is configured, which is not an error.
pub fn generator_from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Option<Arc<dyn TextGenerator>>> {
    let selected = match provider.get_non_empty("generation_provider") {
        Some(value) => value.parse()?,
        None if provider.get_non_empty("gemini_api_key").is_some() => GenerationProvider::Gemini,
        None if provider.get_non_empty("openai_api_key").is_some() => GenerationProvider::OpenAI,
        None => GenerationProvider::Disabled,
    };

    let generator: Option<Arc<dyn TextGenerator>> = match selected {
        GenerationProvider::Gemini => Some(Arc::new(GeminiClient::new(GeminiConfig::from_provider(provider)?)?)),
        GenerationProvider::OpenAI => Some(Arc::new(OpenAIClient::new(OpenAIConfig::from_provider(provider)?)?)),
        GenerationProvider::Disabled => None,
    };

    match &generator {
        Some(generator) => info!(provider = generator.name(), "text generation enabled"),
        None => info!("no generation credential configured, using rule-based replies"),
    }

    Ok(generator)
}

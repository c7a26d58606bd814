//! Chat responder
//!
//! Every message resolves to exactly one [`ChatReply`]: generated text when a
//! generator is configured and answers, a rule-based reply otherwise.
//! Generation failures are logged and absorbed here; they never reach the
//! HTTP caller.

pub mod log;
pub mod rules;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use shop_sdk::{RetryExecutor, ServiceError, TextGenerator};
use tracing::{debug, warn};

pub use log::{ChatEntry, ConversationLog, Role};

/// Which strategy produced a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Generated,
    Fallback,
}

/// The answer to one chat message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatReply {
    Generated(String),
    Fallback(String),
}

impl ChatReply {
    pub fn text(&self) -> &str {
        match self {
            ChatReply::Generated(text) | ChatReply::Fallback(text) => text,
        }
    }

    pub fn provenance(&self) -> Provenance {
        match self {
            ChatReply::Generated(_) => Provenance::Generated,
            ChatReply::Fallback(_) => Provenance::Fallback,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            ChatReply::Generated(text) | ChatReply::Fallback(text) => text,
        }
    }
}

/// What the generation step came back with
#[derive(Debug)]
pub enum GenerationOutcome {
    /// No generator configured
    Unconfigured,
    /// Generation failed after retries
    Failed(ServiceError),
    /// Generation answered, possibly with blank text
    Produced(String),
}

/// Pick the reply for `message` given the generation outcome
pub fn select_reply(outcome: &GenerationOutcome, message: &str) -> ChatReply {
    match outcome {
        GenerationOutcome::Produced(text) if !text.trim().is_empty() => ChatReply::Generated(text.clone()),
        _ => ChatReply::Fallback(rules::fallback_reply(message).to_string()),
    }
}

pub struct ChatResponder {
    generator: Option<Arc<dyn TextGenerator>>,
    retry: RetryExecutor,
    deadline: Duration,
}

impl ChatResponder {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>, retry: RetryExecutor, deadline: Duration) -> Self {
        Self {
            generator,
            retry,
            deadline,
        }
    }

    /// Name of the configured generator, if any
    pub fn generator_name(&self) -> Option<&'static str> {
        self.generator.as_ref().map(|generator| generator.name())
    }

    /// Resolve `message` to a reply; never fails
    pub async fn respond(&self, message: &str) -> ChatReply {
        let outcome = self.generate(message).await;
        let reply = select_reply(&outcome, message);

        match &outcome {
            GenerationOutcome::Unconfigured => {
                debug!(rule = rules::classify(message), "no generator configured, using rule-based reply");
            }
            GenerationOutcome::Failed(err) => {
                warn!(
                    provider = self.generator_name().unwrap_or("unknown"),
                    kind = err.kind(),
                    attempts = err.attempts().unwrap_or(1),
                    error = %err,
                    rule = rules::classify(message),
                    "generation failed, using rule-based reply"
                );
            }
            GenerationOutcome::Produced(text) if text.trim().is_empty() => {
                warn!(
                    provider = self.generator_name().unwrap_or("unknown"),
                    rule = rules::classify(message),
                    "generator returned blank text, using rule-based reply"
                );
            }
            GenerationOutcome::Produced(_) => {
                debug!(provider = self.generator_name().unwrap_or("unknown"), "generated reply");
            }
        }

        reply
    }

    async fn generate(&self, message: &str) -> GenerationOutcome {
        let Some(generator) = &self.generator else {
            return GenerationOutcome::Unconfigured;
        };

        match self.retry.execute_within(self.deadline, || generator.generate(message)).await {
            Ok(text) => GenerationOutcome::Produced(text),
            Err(err) => GenerationOutcome::Failed(err),
        }
    }
}

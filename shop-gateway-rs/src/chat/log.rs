//! Append-only conversation log
//!
//! A user message and the reply to it are appended under one lock
//! acquisition, so concurrent chats never interleave half-exchanges and the
//! log always holds an even number of entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::{ChatReply, Provenance};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One conversation log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEntry {
    /// Position in the log, from 0
    pub sequence: u64,
    pub role: Role,
    pub text: String,
    pub created_at: DateTime<Utc>,
    /// Set on assistant entries only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Provenance>,
}

#[derive(Debug, Default)]
pub struct ConversationLog {
    entries: Mutex<Vec<ChatEntry>>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user message and its reply as one step
    pub async fn append_exchange(&self, message: &str, reply: &ChatReply) -> (ChatEntry, ChatEntry) {
        let mut entries = self.entries.lock().await;
        let now = Utc::now();
        let next = entries.len() as u64;

        let user = ChatEntry {
            sequence: next,
            role: Role::User,
            text: message.to_string(),
            created_at: now,
            provenance: None,
        };
        let assistant = ChatEntry {
            sequence: next + 1,
            role: Role::Assistant,
            text: reply.text().to_string(),
            created_at: now,
            provenance: Some(reply.provenance()),
        };

        entries.push(user.clone());
        entries.push(assistant.clone());
        (user, assistant)
    }

    /// Copy of the whole log in order
    pub async fn snapshot(&self) -> Vec<ChatEntry> {
        self.entries.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

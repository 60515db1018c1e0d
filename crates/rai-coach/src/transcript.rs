//! Bounded conversation transcript.
//!
//! The transcript always starts with one system message. Appends beyond the
//! cap evict the oldest non-system messages.

use chrono::{DateTime, Utc};
use rai_local_ai::{ChatMessage, Role, StorageError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::store::KeyValueStore;

/// Storage key of the persisted transcript.
pub const TRANSCRIPT_KEY: &str = "rai_conversation_history";

/// One message of the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

impl From<&ConversationMessage> for ChatMessage {
    fn from(message: &ConversationMessage) -> Self {
        ChatMessage::new(message.role, message.content.clone())
    }
}

/// Ordered, capped message log with optional durable persistence.
pub struct TranscriptStore {
    messages: Vec<ConversationMessage>,
    cap: usize,
    /// Bumped on every reset so in-flight work can detect a cleared conversation.
    epoch: u64,
    store: Option<Arc<dyn KeyValueStore>>,
}

impl TranscriptStore {
    /// Transcript holding only `preamble`, capped at `cap` messages (minimum 2).
    pub fn new(preamble: &str, cap: usize) -> Self {
        Self {
            messages: vec![ConversationMessage::new(Role::System, preamble)],
            cap: cap.max(2),
            epoch: 0,
            store: None,
        }
    }

    /// Persist to and restore from `store`.
    pub fn with_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Replace the transcript with a single system message.
    pub fn reset(&mut self, preamble: &str) {
        self.messages.clear();
        self.messages
            .push(ConversationMessage::new(Role::System, preamble));
        self.epoch += 1;
    }

    /// Append a message, evicting the oldest non-system messages past the cap.
    pub fn append(&mut self, role: Role, content: impl Into<String>) {
        self.messages.push(ConversationMessage::new(role, content));

        if self.messages.len() > self.cap {
            let excess = self.messages.len() - self.cap;
            self.messages.drain(1..1 + excess);
            debug!("Transcript trimmed by {} message(s)", excess);
        }
    }

    /// Copy of the messages in insertion order.
    pub fn history(&self, include_system: bool) -> Vec<ConversationMessage> {
        self.messages
            .iter()
            .filter(|m| include_system || m.role != Role::System)
            .cloned()
            .collect()
    }

    /// The last `limit` non-system messages.
    pub fn recent(&self, limit: usize) -> &[ConversationMessage] {
        let body = &self.messages[1.min(self.messages.len())..];
        &body[body.len().saturating_sub(limit)..]
    }

    pub fn system_message(&self) -> Option<&ConversationMessage> {
        self.messages.first().filter(|m| m.role == Role::System)
    }

    /// Write the transcript to the store, if one is attached.
    pub fn persist(&self) -> Result<(), StorageError> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let json = serde_json::to_string(&self.messages)?;
        store.set_item(TRANSCRIPT_KEY, &json)
    }

    /// Delete the persisted transcript, if a store is attached.
    pub fn forget(&self) -> Result<(), StorageError> {
        match &self.store {
            Some(store) => store.remove_item(TRANSCRIPT_KEY),
            None => Ok(()),
        }
    }

    /// Load the persisted transcript.
    ///
    /// A missing, unreadable or malformed entry leaves a fresh transcript
    /// seeded with `preamble` and returns `false`. A restored transcript gets
    /// the current `preamble` as its system message.
    pub fn restore(&mut self, preamble: &str) -> bool {
        match self.load() {
            Ok(Some(mut messages)) => {
                messages[0] = ConversationMessage::new(Role::System, preamble);
                self.messages = messages;
                if self.messages.len() > self.cap {
                    let excess = self.messages.len() - self.cap;
                    self.messages.drain(1..1 + excess);
                }
                debug!("Restored {} transcript message(s)", self.messages.len() - 1);
                true
            }
            Ok(None) => {
                self.reset(preamble);
                false
            }
            Err(e) => {
                warn!("Could not restore conversation history: {}", e);
                self.reset(preamble);
                false
            }
        }
    }

    fn load(&self) -> Result<Option<Vec<ConversationMessage>>, StorageError> {
        let Some(store) = &self.store else {
            return Ok(None);
        };
        let Some(json) = store.get_item(TRANSCRIPT_KEY)? else {
            return Ok(None);
        };
        let messages: Vec<ConversationMessage> = serde_json::from_str(&json)?;
        match messages.first() {
            Some(first) if first.role == Role::System => Ok(Some(messages)),
            _ => Ok(None),
        }
    }
}

//! Chat message format used by the `/generate` endpoint.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            content: text.into(),
        }
    }
}

/// Chat history plus the "send context" toggle.
///
/// With context enabled the whole history travels with every new message;
/// with it disabled only the newest user message is sent.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    context_enabled: bool,
}

impl Conversation {
    pub fn new(context_enabled: bool) -> Self {
        Self {
            messages: Vec::new(),
            context_enabled,
        }
    }

    pub fn context_enabled(&self) -> bool {
        self.context_enabled
    }

    pub fn set_context_enabled(&mut self, enabled: bool) {
        self.context_enabled = enabled;
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Messages to send for a new user turn. Does not record the turn.
    pub fn outgoing(&self, user_message: &str) -> Vec<ChatMessage> {
        let latest = ChatMessage::user(user_message);
        if self.context_enabled {
            let mut all = self.messages.clone();
            all.push(latest);
            all
        } else {
            vec![latest]
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

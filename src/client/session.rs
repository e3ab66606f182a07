use crate::common::{ChatMessage, Sender};

/// Transient transcript of one terminal chat. Nothing is persisted.
pub struct ChatSession {
    messages: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn push_user(&mut self, text: impl Into<String>) -> &ChatMessage {
        self.push(Sender::User, text)
    }

    pub fn push_agent(&mut self, text: impl Into<String>) -> &ChatMessage {
        self.push(Sender::Agent, text)
    }

    pub fn push_system(&mut self, text: impl Into<String>) -> &ChatMessage {
        self.push(Sender::System, text)
    }

    fn push(&mut self, sender: Sender, text: impl Into<String>) -> &ChatMessage {
        self.messages.push(ChatMessage::new(sender, text));
        &self.messages[self.messages.len() - 1]
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

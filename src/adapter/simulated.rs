use async_trait::async_trait;

use crate::common::ChatMessage;

use super::{AdapterError, AgentClientAdapter, AgentReply};

/// Fabricates replies locally. Used when no backend is configured and as the
/// relay's fallback for deferred messages.
#[derive(Debug, Clone, Default)]
pub struct SimulatedAdapter;

impl SimulatedAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AgentClientAdapter for SimulatedAdapter {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn check_availability(&self) -> bool {
        true
    }

    async fn send_message(&self, text: &str) -> Result<AgentReply, AdapterError> {
        if text.is_empty() {
            return Err(AdapterError::Rejected("empty message".into()));
        }
        Ok(AgentReply {
            reply_text: format!(
                "I received your message: \"{text}\". The agent backend integration will answer here."
            ),
        })
    }

    async fn fetch_history(&self) -> Vec<ChatMessage> {
        Vec::new()
    }
}

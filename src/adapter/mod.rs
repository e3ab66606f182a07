//! Adapters translating relay calls into calls on the external agent service.

mod remote;
mod simulated;

use std::sync::Arc;

use async_trait::async_trait;

use crate::common::ChatMessage;
use crate::config::{AdapterKind, AppConfig};

pub use remote::RemoteAdapter;
pub use simulated::SimulatedAdapter;

#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("agent backend unreachable: {0}")]
    Unavailable(String),
    #[error("agent backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed agent reply: {0}")]
    Malformed(String),
    #[error("message rejected: {0}")]
    Rejected(String),
}

/// Normalized reply from any adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentReply {
    pub reply_text: String,
}

/// One conversational-agent backend. Implementations never retry; the relay
/// owns the fallback policy.
#[async_trait]
pub trait AgentClientAdapter: Send + Sync {
    fn name(&self) -> &str;

    /// `false` on any network, timeout or status failure.
    async fn check_availability(&self) -> bool;

    async fn send_message(&self, text: &str) -> Result<AgentReply, AdapterError>;

    /// Empty on any failure.
    async fn fetch_history(&self) -> Vec<ChatMessage>;
}

pub type SharedAdapter = Arc<dyn AgentClientAdapter>;

/// Picks the adapter named by the configuration. A remote adapter that
/// cannot be built degrades to the simulated one.
pub fn build_adapter(config: &AppConfig) -> SharedAdapter {
    match config.adapter {
        AdapterKind::Simulated => Arc::new(SimulatedAdapter::new()),
        AdapterKind::Remote => match RemoteAdapter::from_config(&config.backend) {
            Ok(adapter) => {
                log::info!("Relaying messages to agent backend at {}", adapter.base_url());
                Arc::new(adapter)
            }
            Err(err) => {
                log::warn!("Remote adapter unavailable ({err}); falling back to simulated replies");
                Arc::new(SimulatedAdapter::new())
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_kind_builds_simulated_adapter() {
        let config = AppConfig {
            adapter: AdapterKind::Simulated,
            ..AppConfig::default()
        };
        assert_eq!(build_adapter(&config).name(), "simulated");
    }

    #[test]
    fn remote_without_url_degrades_to_simulated() {
        let config = AppConfig::default();
        assert_eq!(build_adapter(&config).name(), "simulated");
    }

    #[test]
    fn remote_with_url_builds_remote_adapter() {
        let mut config = AppConfig::default();
        config.backend.url = Some("http://127.0.0.1:3000/api/direct".into());
        assert_eq!(build_adapter(&config).name(), "remote");
    }
}

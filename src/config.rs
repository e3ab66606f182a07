use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "config/relay.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    /// Forward messages to the agent backend over HTTP
    #[default]
    Remote,
    /// Answer locally with fabricated replies
    Simulated,
}

impl AdapterKind {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "remote" => Some(AdapterKind::Remote),
            "simulated" => Some(AdapterKind::Simulated),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub port: u16,
    pub adapter: AdapterKind,
    pub backend: BackendConfig,
    pub relay: RelayConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            adapter: AdapterKind::default(),
            backend: BackendConfig::default(),
            relay: RelayConfig::default(),
        }
    }
}

/// Connection details for the external agent service.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub project_id: Option<String>,
    pub timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            model: None,
            project_id: None,
            timeout_ms: 10_000,
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// Keeps the API key out of logs.
impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("project_id", &self.project_id)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

/// Fallback and retention policy for pending replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Background retries against the primary adapter before the simulated fallback answers.
    pub deferred_attempts: u32,
    pub retry_delay_ms: u64,
    pub pending_ttl_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            deferred_attempts: 1,
            retry_delay_ms: 500,
            pending_ttl_secs: 300,
            sweep_interval_secs: 60,
        }
    }
}

impl RelayConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn pending_ttl(&self) -> Duration {
        Duration::from_secs(self.pending_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl AppConfig {
    /// File values overlaid with the process environment.
    pub fn load(path: &str) -> Self {
        let mut config = load_config(path);
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(port) = var("PORT") {
            match port.trim().parse() {
                Ok(port) => self.port = port,
                Err(err) => log::warn!("Ignoring invalid PORT `{port}`: {err}"),
            }
        }
        if let Some(kind) = var("AGENT_ADAPTER") {
            match AdapterKind::parse(&kind) {
                Some(kind) => self.adapter = kind,
                None => log::warn!("Ignoring unknown AGENT_ADAPTER `{kind}`"),
            }
        }
        if let Some(url) = var("AGENT_BACKEND_URL") {
            self.backend.url = Some(url);
        }
        if let Some(key) = var("AGENT_API_KEY") {
            self.backend.api_key = Some(key);
        }
        if let Some(model) = var("AGENT_MODEL") {
            self.backend.model = Some(model);
        }
        if let Some(project) = var("GOOGLE_CLOUD_PROJECT") {
            self.backend.project_id = Some(project);
        }
    }

    /// Missing credentials are reported, never fatal.
    pub fn warn_missing_backend(&self) {
        if self.adapter != AdapterKind::Remote {
            return;
        }
        if self.backend.url.is_none() {
            log::warn!("AGENT_BACKEND_URL is not set; replies will be simulated");
        }
        if self.backend.api_key.is_none() {
            log::warn!("AGENT_API_KEY is not set; backend requests are unauthenticated");
        }
        if self.backend.model.is_none() {
            log::warn!("AGENT_MODEL is not set; the backend default model applies");
        }
        if self.backend.project_id.is_none() {
            log::warn!("GOOGLE_CLOUD_PROJECT is not set");
        }
    }
}

pub fn load_config(path: &str) -> AppConfig {
    let path = Path::new(path);
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Failed to parse config file {}: {err}", path.display());
                AppConfig::default()
            }
        },
        Err(err) => {
            log::info!(
                "Config file {} not found ({err}); using defaults",
                path.display()
            );
            AppConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn missing_file_yields_defaults() {
        let config = load_config("does/not/exist.json");
        assert_eq!(config.port, 8080);
        assert_eq!(config.adapter, AdapterKind::Remote);
        assert_eq!(config.relay.deferred_attempts, 1);
        assert_eq!(config.backend.timeout_ms, 10_000);
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.json");
        fs::write(
            &path,
            r#"{"port": 9000, "adapter": "simulated", "relay": {"pending_ttl_secs": 5}}"#,
        )
        .unwrap();

        let config = load_config(path.to_str().unwrap());
        assert_eq!(config.port, 9000);
        assert_eq!(config.adapter, AdapterKind::Simulated);
        assert_eq!(config.relay.pending_ttl(), Duration::from_secs(5));
        assert_eq!(config.relay.retry_delay_ms, 500);
    }

    #[test]
    fn unparsable_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.json");
        fs::write(&path, "{ nope").unwrap();

        let config = load_config(path.to_str().unwrap());
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn environment_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            ("PORT", "3000"),
            ("AGENT_ADAPTER", "Simulated"),
            ("AGENT_BACKEND_URL", "http://agent.local"),
            ("AGENT_API_KEY", "secret"),
            ("AGENT_MODEL", ""),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_env(|key| env.get(key).map(|value| value.to_string()));

        assert_eq!(config.port, 3000);
        assert_eq!(config.adapter, AdapterKind::Simulated);
        assert_eq!(config.backend.url.as_deref(), Some("http://agent.local"));
        assert_eq!(config.backend.api_key.as_deref(), Some("secret"));
        assert_eq!(config.backend.model, None);
    }

    #[test]
    fn invalid_port_is_ignored() {
        let mut config = AppConfig::default();
        config.apply_env(|key| (key == "PORT").then(|| "eighty".to_string()));
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let backend = BackendConfig {
            api_key: Some("top-secret".into()),
            ..BackendConfig::default()
        };
        let rendered = format!("{backend:?}");
        assert!(!rendered.contains("top-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}

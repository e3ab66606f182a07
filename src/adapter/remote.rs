use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::{ChatMessage, Sender, iso_timestamp};
use crate::config::BackendConfig;

use super::{AdapterError, AgentClientAdapter, AgentReply};

/// Talks to the agent service's direct-client API:
/// `GET {base}/status`, `POST {base}/message`, `GET {base}/history`.
pub struct RemoteAdapter {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    model: Option<String>,
}

#[derive(Serialize)]
struct OutgoingMessage<'a> {
    message: &'a str,
    sender: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

/// The only reply shape accepted from the backend.
#[derive(Deserialize)]
struct ReplyBody {
    response: String,
}

#[derive(Deserialize)]
struct HistoryBody {
    #[serde(default)]
    history: Vec<HistoryEntry>,
}

#[derive(Deserialize)]
struct HistoryEntry {
    id: Option<String>,
    text: String,
    sender: Option<String>,
    timestamp: Option<String>,
}

impl From<HistoryEntry> for ChatMessage {
    fn from(entry: HistoryEntry) -> Self {
        ChatMessage {
            id: entry.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            text: entry.text,
            sender: entry
                .sender
                .as_deref()
                .map(Sender::from_tag)
                .unwrap_or(Sender::Agent),
            timestamp: entry
                .timestamp
                .unwrap_or_else(|| iso_timestamp(Utc::now())),
        }
    }
}

impl RemoteAdapter {
    pub fn new(base_url: impl Into<String>) -> Result<Self, AdapterError> {
        Self::from_config(&BackendConfig {
            url: Some(base_url.into()),
            ..BackendConfig::default()
        })
    }

    pub fn from_config(backend: &BackendConfig) -> Result<Self, AdapterError> {
        let base_url = backend
            .url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| AdapterError::Unavailable("no backend URL configured".into()))?;

        let http = Client::builder()
            .timeout(backend.timeout())
            .build()
            .map_err(|err| AdapterError::Unavailable(err.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: backend.api_key.clone(),
            model: backend.model.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

fn parse_reply(body: &str) -> Result<AgentReply, AdapterError> {
    let parsed: ReplyBody =
        serde_json::from_str(body).map_err(|err| AdapterError::Malformed(err.to_string()))?;
    if parsed.response.trim().is_empty() {
        return Err(AdapterError::Malformed("empty `response` field".into()));
    }
    Ok(AgentReply {
        reply_text: parsed.response,
    })
}

#[async_trait]
impl AgentClientAdapter for RemoteAdapter {
    fn name(&self) -> &str {
        "remote"
    }

    async fn check_availability(&self) -> bool {
        let request = self.authorize(self.http.get(self.endpoint("status")));
        match request.send().await {
            Ok(response) if response.status().is_success() => {
                log::debug!("Agent backend is available");
                true
            }
            Ok(response) => {
                log::warn!("Agent backend status check returned {}", response.status());
                false
            }
            Err(err) => {
                log::warn!("Agent backend status check failed: {err}");
                false
            }
        }
    }

    async fn send_message(&self, text: &str) -> Result<AgentReply, AdapterError> {
        if text.is_empty() {
            return Err(AdapterError::Rejected("empty message".into()));
        }

        let body = OutgoingMessage {
            message: text,
            sender: Sender::User.as_str(),
            model: self.model.as_deref(),
        };
        let response = self
            .authorize(self.http.post(self.endpoint("message")))
            .json(&body)
            .send()
            .await
            .map_err(|err| AdapterError::Unavailable(err.to_string()))?;

        let status = response.status();
        let payload = response
            .text()
            .await
            .map_err(|err| AdapterError::Unavailable(err.to_string()))?;

        if !status.is_success() {
            return Err(AdapterError::Status {
                status: status.as_u16(),
                body: payload,
            });
        }

        parse_reply(&payload).inspect_err(|err| {
            log::warn!("Rejecting agent reply: {err}");
        })
    }

    async fn fetch_history(&self) -> Vec<ChatMessage> {
        let request = self.authorize(self.http.get(self.endpoint("history")));
        let response = match request.send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                log::warn!("Failed to get history: {}", response.status());
                return Vec::new();
            }
            Err(err) => {
                log::warn!("Failed to get history: {err}");
                return Vec::new();
            }
        };

        match response.json::<HistoryBody>().await {
            Ok(body) => body.history.into_iter().map(ChatMessage::from).collect(),
            Err(err) => {
                log::warn!("Malformed history payload: {err}");
                Vec::new()
            }
        }
    }
}

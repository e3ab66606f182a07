use std::time::Duration;

use reqwest::Client;
use tokio::task::{AbortHandle, JoinHandle};

use crate::common::FALLBACK_REPLY;
use crate::common::wire::{ErrorBody, MessageRequest, PollResponse, RelayResponse};

/// How long a client waits for a deferred reply.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_polls: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
            max_polls: 30,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("relay request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("relay rejected message ({status}): {error}")]
    Rejected { status: u16, error: String },
    #[error("no reply after {0} polls")]
    Exhausted(u32),
    #[error("reply cancelled")]
    Cancelled,
    #[error("reply task failed: {0}")]
    Task(String),
}

#[derive(Clone)]
pub struct RelayClient {
    http: Client,
    base_url: String,
    policy: PollPolicy,
}

impl RelayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            policy: PollPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Starts the exchange on a background task; the handle can be awaited or aborted.
    pub fn send(&self, text: impl Into<String>) -> PendingReply {
        let client = self.clone();
        let text = text.into();
        PendingReply {
            handle: tokio::spawn(async move { client.exchange(&text).await }),
        }
    }

    /// Submits `text` and returns the direct reply, or polls for the deferred one.
    pub async fn exchange(&self, text: &str) -> Result<String, ClientError> {
        let ack = self.submit(text).await?;
        match ack.response {
            Some(reply) => Ok(reply),
            None => self.poll(&ack.message_id).await,
        }
    }

    async fn submit(&self, text: &str) -> Result<RelayResponse, ClientError> {
        let response = self
            .http
            .post(format!("{}/api/message", self.base_url))
            .json(&MessageRequest {
                message: text.to_string(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| status.to_string());
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                error,
            });
        }
        Ok(response.json().await?)
    }

    async fn poll(&self, message_id: &str) -> Result<String, ClientError> {
        let url = format!("{}/api/response/{message_id}", self.base_url);
        for attempt in 1..=self.policy.max_polls {
            tokio::time::sleep(self.policy.interval).await;
            let poll: PollResponse = self
                .http
                .get(&url)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            if poll.complete {
                log::debug!("Reply for {message_id} ready after {attempt} polls");
                return Ok(poll.message.unwrap_or_else(|| FALLBACK_REPLY.to_string()));
            }
        }
        Err(ClientError::Exhausted(self.policy.max_polls))
    }
}

/// An in-flight exchange.
pub struct PendingReply {
    handle: JoinHandle<Result<String, ClientError>>,
}

impl PendingReply {
    pub fn abort(&self) {
        self.handle.abort();
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.handle.abort_handle()
    }

    pub async fn wait(self) -> Result<String, ClientError> {
        match self.handle.await {
            Ok(result) => result,
            Err(err) if err.is_cancelled() => Err(ClientError::Cancelled),
            Err(err) => Err(ClientError::Task(err.to_string())),
        }
    }

    /// The reply, or the literal apology on any failure.
    pub async fn reply_text(self) -> String {
        self.wait().await.unwrap_or_else(|err| {
            log::warn!("Message exchange failed: {err}");
            FALLBACK_REPLY.to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn quick() -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(5),
            max_polls: 3,
        }
    }

    async fn acknowledging_relay(poll_body: serde_json::Value) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/message"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "messageId": "1760780000000",
                "timestamp": "2026-10-18T09:30:00.000Z",
                "message": "processing"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/response/1760780000000"))
            .respond_with(ResponseTemplate::new(200).set_body_json(poll_body))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn direct_reply_skips_polling() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/message"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "messageId": "1",
                "timestamp": "2026-10-18T09:30:00.000Z",
                "response": "hi there"
            })))
            .mount(&server)
            .await;

        let client = RelayClient::new(server.uri()).with_policy(quick());
        assert_eq!(client.exchange("hello").await.unwrap(), "hi there");
    }

    #[tokio::test]
    async fn polls_until_complete() {
        let server = acknowledging_relay(json!({"message": "late reply", "complete": true})).await;
        let client = RelayClient::new(server.uri()).with_policy(quick());
        assert_eq!(client.send("hello").wait().await.unwrap(), "late reply");
    }

    #[tokio::test]
    async fn gives_up_after_poll_budget() {
        let server = acknowledging_relay(json!({"message": null, "complete": false})).await;
        let client = RelayClient::new(server.uri()).with_policy(quick());

        let err = client.exchange("hello").await.unwrap_err();
        assert!(matches!(err, ClientError::Exhausted(3)));
        assert_eq!(
            client.send("hello").reply_text().await,
            FALLBACK_REPLY
        );
    }

    #[tokio::test]
    async fn aborted_exchange_is_cancelled() {
        let server = acknowledging_relay(json!({"message": null, "complete": false})).await;
        let client = RelayClient::new(server.uri()).with_policy(PollPolicy {
            interval: Duration::from_secs(60),
            max_polls: 30,
        });

        let pending = client.send("hello");
        pending.abort();
        assert!(matches!(pending.wait().await, Err(ClientError::Cancelled)));
    }

    #[tokio::test]
    async fn rejected_input_surfaces_error_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/message"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"error": "Invalid message format"})),
            )
            .mount(&server)
            .await;

        let client = RelayClient::new(server.uri());
        match client.exchange("").await {
            Err(ClientError::Rejected { status, error }) => {
                assert_eq!(status, 400);
                assert_eq!(error, "Invalid message format");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingStatus {
    Pending,
    Complete,
    Failed,
}

/// Lifecycle record of one relayed message.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub message_id: String,
    pub submitted_at: DateTime<Utc>,
    pub status: PendingStatus,
    pub reply: Option<String>,
    updated_at: Instant,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("message id {0} already issued")]
    DuplicateId(String),
}

/// In-memory `messageId -> PendingRequest` map shared by the relay handlers.
///
/// Each id is written once on insert and at most once more when it leaves
/// `Pending`; resolved entries are evicted once they have not changed for a
/// TTL. Entries still in `Pending` are never evicted.
#[derive(Debug, Clone, Default)]
pub struct PendingStore {
    entries: Arc<RwLock<HashMap<String, PendingRequest>>>,
}

impl PendingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_pending(
        &self,
        message_id: &str,
        submitted_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.insert(message_id, submitted_at, PendingStatus::Pending, None)
            .await
    }

    pub async fn insert_complete(
        &self,
        message_id: &str,
        submitted_at: DateTime<Utc>,
        reply: String,
    ) -> Result<(), StoreError> {
        self.insert(message_id, submitted_at, PendingStatus::Complete, Some(reply))
            .await
    }

    async fn insert(
        &self,
        message_id: &str,
        submitted_at: DateTime<Utc>,
        status: PendingStatus,
        reply: Option<String>,
    ) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        if entries.contains_key(message_id) {
            return Err(StoreError::DuplicateId(message_id.to_string()));
        }
        entries.insert(
            message_id.to_string(),
            PendingRequest {
                message_id: message_id.to_string(),
                submitted_at,
                status,
                reply,
                updated_at: Instant::now(),
            },
        );
        Ok(())
    }

    /// Returns `false` when the id is unknown or already resolved.
    pub async fn complete(&self, message_id: &str, reply: String) -> bool {
        self.resolve(message_id, PendingStatus::Complete, Some(reply))
            .await
    }

    pub async fn fail(&self, message_id: &str) -> bool {
        self.resolve(message_id, PendingStatus::Failed, None).await
    }

    async fn resolve(&self, message_id: &str, status: PendingStatus, reply: Option<String>) -> bool {
        let mut entries = self.entries.write().await;
        match entries.get_mut(message_id) {
            Some(entry) if entry.status == PendingStatus::Pending => {
                entry.status = status;
                entry.reply = reply;
                entry.updated_at = Instant::now();
                true
            }
            _ => false,
        }
    }

    pub async fn get(&self, message_id: &str) -> Option<PendingRequest> {
        self.entries.read().await.get(message_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn evict_expired(&self, ttl: Duration) -> usize {
        match Instant::now().checked_sub(ttl) {
            Some(cutoff) => self.evict_before(cutoff).await,
            None => 0,
        }
    }

    async fn evict_before(&self, cutoff: Instant) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| {
            entry.status == PendingStatus::Pending || entry.updated_at >= cutoff
        });
        before - entries.len()
    }

    /// Periodically drops entries older than `ttl`.
    pub fn spawn_sweeper(&self, ttl: Duration, every: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let evicted = store.evict_expired(ttl).await;
                if evicted > 0 {
                    log::info!(
                        "Evicted {evicted} expired replies, {} still tracked",
                        store.len().await
                    );
                }
            }
        })
    }
}

//! HTTP surface of the relay.

mod error;
mod handlers;
mod page;
mod relay;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tokio::signal;

use crate::adapter::{SharedAdapter, SimulatedAdapter};
use crate::common::MessageIdGenerator;
use crate::config::RelayConfig;
use crate::storage::PendingStore;

pub use error::ApiError;

/// Everything a request handler needs, injected through axum state.
#[derive(Clone)]
pub struct RelayContext {
    pub adapter: SharedAdapter,
    /// Answers deferred messages once the primary adapter has given up.
    pub fallback: SharedAdapter,
    pub ids: Arc<MessageIdGenerator>,
    pub pending: PendingStore,
    pub settings: RelayConfig,
}

impl RelayContext {
    pub fn new(adapter: SharedAdapter, settings: RelayConfig) -> Self {
        Self {
            adapter,
            fallback: Arc::new(SimulatedAdapter::new()),
            ids: Arc::new(MessageIdGenerator::new()),
            pending: PendingStore::new(),
            settings,
        }
    }

    pub fn with_fallback(mut self, fallback: SharedAdapter) -> Self {
        self.fallback = fallback;
        self
    }
}

pub fn router(context: RelayContext) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/api/message", post(handlers::post_message))
        .route("/api/response/{message_id}", get(handlers::get_response))
        .route("/api/direct/status", get(handlers::direct_status))
        .route("/api/direct/message", post(handlers::direct_message))
        .route("/api/direct/history", get(handlers::direct_history))
        .layer(middleware::from_fn(log_request))
        .with_state(context)
}

async fn log_request(request: Request, next: Next) -> Response {
    log::info!("{} {}", request.method(), request.uri().path());
    next.run(request).await
}

/// Serves the relay until Ctrl-C.
pub async fn serve(context: RelayContext, addr: SocketAddr) -> anyhow::Result<()> {
    let sweeper = context.pending.spawn_sweeper(
        context.settings.pending_ttl(),
        context.settings.sweep_interval(),
    );

    let listener = TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    log::info!("Server running on {local_addr}");
    log::info!(
        "Visit http://localhost:{} to access the chat interface",
        local_addr.port()
    );

    axum::serve(listener, router(context))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    log::info!("Relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    log::info!("Received shutdown signal, draining connections...");
}

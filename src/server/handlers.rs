use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use chrono::Utc;
use serde_json::Value;

use crate::common::wire::{
    DirectMessageRequest, DirectMessageResponse, HistoryResponse, PollResponse, RelayResponse,
    StatusResponse,
};
use crate::common::{FALLBACK_REPLY, PROCESSING_ACK, iso_timestamp};
use crate::storage::PendingStatus;

use super::error::ApiError;
use super::page::INDEX_HTML;
use super::{RelayContext, relay};

pub(super) async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub(super) async fn health() -> &'static str {
    "OK"
}

/// Only a JSON object whose `message` is a non-empty string is accepted.
fn message_text(payload: Result<Json<Value>, JsonRejection>) -> Result<String, ApiError> {
    let Json(body) = payload.map_err(|rejection| {
        log::debug!("Rejected message body: {rejection}");
        ApiError::InvalidInput
    })?;
    match body.get("message").and_then(Value::as_str) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(ApiError::InvalidInput),
    }
}

pub(super) async fn post_message(
    State(ctx): State<RelayContext>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<RelayResponse>, ApiError> {
    let text = message_text(payload)?;

    let message_id = ctx.ids.next_id();
    let submitted_at = Utc::now();
    let timestamp = iso_timestamp(submitted_at);

    match ctx.adapter.send_message(&text).await {
        Ok(reply) => {
            ctx.pending
                .insert_complete(&message_id, submitted_at, reply.reply_text.clone())
                .await
                .map_err(ApiError::internal)?;
            Ok(Json(RelayResponse {
                message_id,
                timestamp,
                response: Some(reply.reply_text),
                message: None,
            }))
        }
        Err(err) => {
            log::warn!(
                "Adapter `{}` could not answer message {message_id}: {err}",
                ctx.adapter.name()
            );
            ctx.pending
                .insert_pending(&message_id, submitted_at)
                .await
                .map_err(ApiError::internal)?;
            relay::spawn_deferred_reply(ctx.clone(), message_id.clone(), text);
            Ok(Json(RelayResponse {
                message_id,
                timestamp,
                response: None,
                message: Some(PROCESSING_ACK.to_string()),
            }))
        }
    }
}

pub(super) async fn get_response(
    State(ctx): State<RelayContext>,
    Path(message_id): Path<String>,
) -> Result<Json<PollResponse>, ApiError> {
    let entry = ctx
        .pending
        .get(&message_id)
        .await
        .ok_or(ApiError::NotFound)?;

    let poll = match entry.status {
        PendingStatus::Pending => PollResponse {
            message: None,
            complete: false,
            failed: false,
        },
        PendingStatus::Complete => PollResponse {
            message: entry.reply,
            complete: true,
            failed: false,
        },
        PendingStatus::Failed => PollResponse {
            message: Some(FALLBACK_REPLY.to_string()),
            complete: true,
            failed: true,
        },
    };
    Ok(Json(poll))
}

pub(super) async fn direct_status(State(ctx): State<RelayContext>) -> impl IntoResponse {
    let available = ctx.adapter.check_availability().await;
    let status = if available {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(StatusResponse { available }))
}

pub(super) async fn direct_message(
    State(ctx): State<RelayContext>,
    payload: Result<Json<DirectMessageRequest>, JsonRejection>,
) -> Result<Json<DirectMessageResponse>, ApiError> {
    let Json(request) = payload.map_err(|_| ApiError::InvalidInput)?;
    if request.message.is_empty() {
        return Err(ApiError::InvalidInput);
    }
    if let Some(sender) = request.sender.as_deref().filter(|sender| *sender != "user") {
        log::debug!("Direct message tagged `{sender}` is forwarded as user input");
    }

    let reply = ctx
        .adapter
        .send_message(&request.message)
        .await
        .map_err(ApiError::AdapterUnavailable)?;
    Ok(Json(DirectMessageResponse {
        response: reply.reply_text,
    }))
}

pub(super) async fn direct_history(State(ctx): State<RelayContext>) -> Json<HistoryResponse> {
    Json(HistoryResponse {
        history: ctx.adapter.fetch_history().await,
    })
}

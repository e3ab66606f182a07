use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::adapter::AdapterError;
use crate::common::wire::ErrorBody;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid message format")]
    InvalidInput,
    #[error("Message not found")]
    NotFound,
    #[error("Agent backend request failed")]
    AdapterUnavailable(#[source] AdapterError),
    #[error("Failed to process message")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        Self::Internal(err.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::AdapterUnavailable(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Internal(detail) => log::error!("Error processing message: {detail}"),
            Self::AdapterUnavailable(err) => log::warn!("Direct relay failed: {err}"),
            _ => {}
        }
        let payload = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(payload)).into_response()
    }
}

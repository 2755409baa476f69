//! Error types: the gateway's per-call `BroadcastError` and the HTTP-facing `AppError`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Coarse classification of a [`BroadcastError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidRequest,
    Signing,
    Transport,
    Config,
}

/// Failure of a single publish call. Never carries secret material.
#[derive(Error, Debug)]
pub enum BroadcastError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("signing error: {0}")]
    Signing(String),

    /// Network failure, timeout, or non-2xx answer. `status` is set when upstream replied.
    #[error("transport error: {message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

impl BroadcastError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BroadcastError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            BroadcastError::Signing(_) => ErrorKind::Signing,
            BroadcastError::Transport { .. } => ErrorKind::Transport,
            BroadcastError::Config(_) => ErrorKind::Config,
        }
    }

    /// Upstream HTTP status, if the upstream answered at all.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            BroadcastError::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<serde_json::Error> for BroadcastError {
    fn from(e: serde_json::Error) -> Self {
        BroadcastError::InvalidRequest(format!("payload is not serializable: {}", e))
    }
}

/// Application-level errors returned by HTTP handlers.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Broadcast(#[from] BroadcastError),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication failed: {0}")]
    Auth(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Broadcast(e) => {
                let status = match e.kind() {
                    ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
                    ErrorKind::Transport => StatusCode::BAD_GATEWAY,
                    ErrorKind::Signing | ErrorKind::Config => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.to_string())
            }
            AppError::Redis(e) => (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("Redis connection failed: {}", e),
            ),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
        };

        let mut body = json!({ "status": "error", "error": message });
        if let AppError::Broadcast(e) = &self {
            if let Some(upstream) = e.upstream_status() {
                body["upstream_status"] = json!(upstream);
            }
        }
        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

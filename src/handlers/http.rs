//! HTTP handlers: publish triggers, settings, Redis check, and health.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::credentials::{ApiKey, Credentials, Scheme, Target};
use crate::models::event::{
    BroadcastRequest, PublishRequest, SendMessageRequest, TEST_CHANNEL, TEST_EVENT,
};
use crate::repositories::RedisRepository;
use crate::services::Broadcaster;

const DEFAULT_DIRECT_MESSAGE: &str = "Direct broadcast test";
const HEADER_APP_KEY: &str = "x-app-key";

/// Broadcasting configuration as shown to clients. Has no secret field.
#[derive(Debug, Clone, Serialize)]
pub struct BroadcastSettings {
    pub app_id: String,
    pub key: String,
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
    pub timeout_secs: u64,
}

impl BroadcastSettings {
    pub fn new(credentials: &Credentials, target: &Target, timeout: Duration) -> Self {
        Self {
            app_id: credentials.app_id().to_string(),
            key: credentials.key().to_string(),
            scheme: target.scheme,
            host: target.host.clone(),
            port: target.port,
            timeout_secs: timeout.as_secs(),
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub broadcaster: Arc<dyn Broadcaster>,
    pub redis: RedisRepository,
    pub settings: BroadcastSettings,
    /// Required for `POST /api/broadcast`; `None` rejects every caller.
    pub api_key: Option<ApiKey>,
    /// Directory holding `websockets-test.html`.
    pub static_dir: PathBuf,
}

impl AppState {
    pub fn broadcaster(&self) -> &dyn Broadcaster {
        self.broadcaster.as_ref()
    }
}

fn message_payload(message: &str) -> serde_json::Value {
    json!({ "message": message })
}

/// POST /send-message: publish `{"message": …}` as `test-event` on `test-channel`.
pub async fn send_message(
    State(state): State<AppState>,
    Json(body): Json<SendMessageRequest>,
) -> AppResult<Json<serde_json::Value>> {
    body.validate().map_err(|e| AppError::Validation(e.to_string()))?;
    let message = body
        .message
        .ok_or_else(|| AppError::Validation("message is required".to_string()))?;

    let request = PublishRequest::single(TEST_CHANNEL, TEST_EVENT, message_payload(&message))?;
    state.broadcaster().publish(request).await?;

    Ok(Json(json!({
        "status": "success",
        "message": message
    })))
}

/// POST /test-direct-broadcast: like `/send-message`, message optional; echoes the upstream status.
pub async fn test_direct_broadcast(
    State(state): State<AppState>,
    Json(body): Json<SendMessageRequest>,
) -> AppResult<Json<serde_json::Value>> {
    body.validate().map_err(|e| AppError::Validation(e.to_string()))?;
    let message = body
        .message
        .unwrap_or_else(|| DEFAULT_DIRECT_MESSAGE.to_string());

    let request = PublishRequest::single(TEST_CHANNEL, TEST_EVENT, message_payload(&message))?;
    let ack = state.broadcaster().publish(request).await?;

    Ok(Json(json!({
        "status": "success",
        "message": message,
        "upstream_status": ack.status
    })))
}

/// POST /api/broadcast: publish any event to any channels.
/// Requires header: x-app-key: <BROADCAST_API_KEY>.
pub async fn broadcast(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<BroadcastRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let key = headers
        .get(HEADER_APP_KEY)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    validate_api_key(state.api_key.as_ref(), key)?;

    let request = PublishRequest::try_from(body)?;
    let ack = state.broadcaster().publish(request).await?;

    Ok(Json(json!({
        "status": "success",
        "event": ack.event,
        "channels": ack.channels
    })))
}

fn validate_api_key(expected: Option<&ApiKey>, key: &str) -> AppResult<()> {
    match expected {
        Some(expected) if !key.is_empty() && expected.matches(key) => Ok(()),
        _ => {
            debug!("rejected broadcast: invalid or missing x-app-key");
            Err(AppError::Auth("invalid or missing x-app-key".to_string()))
        }
    }
}

/// GET /check-pusher-settings: redacted broadcasting configuration.
pub async fn check_pusher_settings(State(state): State<AppState>) -> Json<BroadcastSettings> {
    Json(state.settings.clone())
}

/// GET /redis-test: SET/GET round trip of a fixed key.
pub async fn redis_test(State(state): State<AppState>) -> AppResult<Json<serde_json::Value>> {
    let value = state.redis.health_check().await?;
    Ok(Json(json!({
        "status": "success",
        "message": "Redis connection is working!",
        "test_value": value
    })))
}

/// GET /health: liveness check.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "service": "pushgate" })),
    )
}

//! Signed broadcast gateway for Pusher-compatible event APIs.
//!
//! Builds HMAC-signed publish requests for the `/apps/{id}/events` endpoint and
//! sends them with a bounded timeout. A small HTTP surface triggers publishes.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod services;

pub use config::Config;
pub use error::{AppError, BroadcastError, ErrorKind};
pub use handlers::http::{AppState, BroadcastSettings};
pub use models::{ApiKey, Credentials, PublishAck, PublishRequest, Scheme, Target};
pub use services::{BroadcastGateway, Broadcaster, SignedCall, SignedRequestBuilder};

use axum::routing::{get, get_service, post};
use handlers::http;
use tower_http::services::ServeFile;
use tower_http::trace::TraceLayer;

/// Build the API router. Used by main and by integration tests.
pub fn create_app(state: AppState) -> axum::Router {
    let test_page = ServeFile::new(state.static_dir.join("websockets-test.html"));
    axum::Router::new()
        .route("/send-message", post(http::send_message))
        .route("/test-direct-broadcast", post(http::test_direct_broadcast))
        .route("/api/broadcast", post(http::broadcast))
        .route("/check-pusher-settings", get(http::check_pusher_settings))
        .route("/redis-test", get(http::redis_test))
        .route("/health", get(http::health))
        .route("/websockets-test", get_service(test_page))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! Diagnostic hooks for the broadcast gateway. Events never carry the secret or signature.

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::BroadcastError;

/// Something the gateway did while handling one publish.
#[derive(Debug)]
pub enum GatewayEvent<'a> {
    /// Request signed and about to be sent.
    Signed {
        app_id: &'a str,
        auth_key: &'a str,
        event: &'a str,
        channels: &'a [String],
        timestamp: i64,
        body_md5: Option<&'a str>,
    },
    /// Upstream answered 2xx.
    Delivered {
        event: &'a str,
        channels: &'a [String],
        status: u16,
        elapsed: Duration,
    },
    /// Publish failed at any stage.
    Failed {
        event: &'a str,
        channels: &'a [String],
        error: &'a BroadcastError,
    },
}

/// Receives [`GatewayEvent`]s. Must be cheap; it runs inline with the publish.
pub trait BroadcastObserver: Send + Sync {
    fn observe(&self, event: &GatewayEvent<'_>);
}

/// Default observer: structured `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl BroadcastObserver for TracingObserver {
    fn observe(&self, event: &GatewayEvent<'_>) {
        match event {
            GatewayEvent::Signed {
                app_id,
                auth_key,
                event,
                channels,
                timestamp,
                body_md5,
            } => debug!(
                app_id = %app_id,
                auth_key = %auth_key,
                event = %event,
                channels = ?channels,
                timestamp,
                body_md5 = body_md5.unwrap_or(""),
                "publish signed"
            ),
            GatewayEvent::Delivered {
                event,
                channels,
                status,
                elapsed,
            } => info!(
                event = %event,
                channels = ?channels,
                status,
                elapsed_ms = elapsed.as_millis() as u64,
                "broadcast"
            ),
            GatewayEvent::Failed {
                event,
                channels,
                error,
            } => warn!(
                event = %event,
                channels = ?channels,
                kind = ?error.kind(),
                upstream_status = error.upstream_status(),
                error = %error,
                "broadcast failed"
            ),
        }
    }
}

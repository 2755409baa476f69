//! Publish requests, acknowledgements, and HTTP API payloads.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::BroadcastError;
use crate::models::channel::validate_channels;

/// Channel the demo endpoints publish to.
pub const TEST_CHANNEL: &str = "test-channel";
/// Event name the demo endpoints publish.
pub const TEST_EVENT: &str = "test-event";

/// An event to publish on one or more channels. Validated on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishRequest {
    channels: Vec<String>,
    event: String,
    payload: serde_json::Value,
}

impl PublishRequest {
    pub fn new(
        channels: Vec<String>,
        event: impl Into<String>,
        payload: serde_json::Value,
    ) -> Result<Self, BroadcastError> {
        let event = event.into();
        validate_channels(&channels)?;
        if event.is_empty() {
            return Err(BroadcastError::InvalidRequest(
                "event name is empty".to_string(),
            ));
        }
        Ok(Self {
            channels,
            event,
            payload,
        })
    }

    /// Convenience for a single channel.
    pub fn single(
        channel: impl Into<String>,
        event: impl Into<String>,
        payload: serde_json::Value,
    ) -> Result<Self, BroadcastError> {
        Self::new(vec![channel.into()], event, payload)
    }

    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }
}

/// Upstream accepted the publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishAck {
    pub event: String,
    pub channels: Vec<String>,
    /// HTTP status the upstream answered with.
    pub status: u16,
}

/// POST /send-message and /test-direct-broadcast body.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(min = 1, max = 10000))]
    pub message: Option<String>,
}

/// POST /api/broadcast body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastRequest {
    pub channels: Vec<String>,
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl TryFrom<BroadcastRequest> for PublishRequest {
    type Error = BroadcastError;

    fn try_from(body: BroadcastRequest) -> Result<Self, Self::Error> {
        PublishRequest::new(body.channels, body.event, body.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn empty_channel_list_is_invalid() {
        let err = PublishRequest::new(vec![], "e", json!({})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    #[test]
    fn empty_event_is_invalid() {
        let err = PublishRequest::single("c", "", json!({})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    #[test]
    fn broadcast_body_converts() {
        let body: BroadcastRequest = serde_json::from_value(json!({
            "channels": ["a", "b"],
            "event": "ping"
        }))
        .unwrap();
        let req = PublishRequest::try_from(body).unwrap();
        assert_eq!(req.channels(), ["a", "b"]);
        assert_eq!(req.event(), "ping");
        assert!(req.payload().is_null());
    }

    #[test]
    fn send_message_rejects_empty_message() {
        let body = SendMessageRequest {
            message: Some(String::new()),
        };
        assert!(body.validate().is_err());
        let body = SendMessageRequest { message: None };
        assert!(body.validate().is_ok());
    }
}

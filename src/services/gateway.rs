//! Broadcast gateway: sign a publish and send it to the events API.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::instrument;

use crate::config::Config;
use crate::error::BroadcastError;
use crate::models::credentials::{Credentials, Target};
use crate::models::event::{PublishAck, PublishRequest};
use crate::services::observer::{BroadcastObserver, GatewayEvent, TracingObserver};
use crate::services::signer::SignedRequestBuilder;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound on how much of an error body is kept in the error message.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Entry point for publishing events. Implemented by [`BroadcastGateway`]; handlers hold a trait object.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    async fn publish(&self, request: PublishRequest) -> Result<PublishAck, BroadcastError>;
}

/// Publishes events over the signed HTTP API. Cheap to clone; all state is read-only.
#[derive(Clone)]
pub struct BroadcastGateway {
    builder: Arc<SignedRequestBuilder>,
    client: reqwest::Client,
    timeout: Duration,
    observer: Arc<dyn BroadcastObserver>,
}

impl BroadcastGateway {
    pub fn new(
        credentials: Credentials,
        target: Target,
        timeout: Duration,
    ) -> Result<Self, BroadcastError> {
        if timeout.is_zero() {
            return Err(BroadcastError::Config("timeout must be positive".to_string()));
        }
        url::Url::parse(&target.base_url())
            .map_err(|e| BroadcastError::Config(format!("invalid upstream url: {}", e)))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(Policy::none())
            .build()
            .map_err(|e| BroadcastError::Config(format!("http client: {}", e)))?;

        Ok(Self {
            builder: Arc::new(SignedRequestBuilder::new(credentials, target)),
            client,
            timeout,
            observer: Arc::new(TracingObserver),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, BroadcastError> {
        Self::new(
            config.credentials.clone(),
            config.target.clone(),
            config.timeout,
        )
    }

    /// Replace the default [`TracingObserver`].
    pub fn with_observer(mut self, observer: Arc<dyn BroadcastObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn signer(&self) -> &SignedRequestBuilder {
        &self.builder
    }

    /// Publish with an explicit timestamp (Unix seconds). The same value is signed and sent.
    #[instrument(skip(self, request), fields(event = %request.event()))]
    pub async fn publish_at(
        &self,
        request: &PublishRequest,
        timestamp: i64,
    ) -> Result<PublishAck, BroadcastError> {
        let result = self.send(request, timestamp).await;
        if let Err(error) = &result {
            self.observer.observe(&GatewayEvent::Failed {
                event: request.event(),
                channels: request.channels(),
                error,
            });
        }
        result
    }

    async fn send(
        &self,
        request: &PublishRequest,
        timestamp: i64,
    ) -> Result<PublishAck, BroadcastError> {
        let call = self.builder.build(request, timestamp)?;
        self.observer.observe(&GatewayEvent::Signed {
            app_id: self.builder.credentials().app_id(),
            auth_key: self.builder.credentials().key(),
            event: request.event(),
            channels: request.channels(),
            timestamp: call.timestamp,
            body_md5: call.body_md5(),
        });

        let started = Instant::now();
        let response = self
            .client
            .post(call.url.as_str())
            .header(CONTENT_TYPE, "application/json")
            .body(call.body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let text: String = match response.text().await {
                Ok(text) => text.trim().chars().take(MAX_ERROR_BODY_CHARS).collect(),
                Err(e) => format!("<unreadable body: {}>", e.without_url()),
            };
            return Err(BroadcastError::Transport {
                status: Some(status.as_u16()),
                message: format!("upstream returned {}: {}", status, text),
            });
        }

        self.observer.observe(&GatewayEvent::Delivered {
            event: request.event(),
            channels: request.channels(),
            status: status.as_u16(),
            elapsed: started.elapsed(),
        });

        Ok(PublishAck {
            event: request.event().to_string(),
            channels: request.channels().to_vec(),
            status: status.as_u16(),
        })
    }

    /// reqwest errors embed the URL, which carries the auth params; strip it.
    fn transport_error(&self, e: reqwest::Error) -> BroadcastError {
        let e = e.without_url();
        let message = if e.is_timeout() {
            format!("upstream did not answer within {:?}", self.timeout)
        } else if e.is_connect() {
            format!("could not connect to upstream: {}", e)
        } else {
            format!("request failed: {}", e)
        };
        BroadcastError::Transport {
            status: e.status().map(|s| s.as_u16()),
            message,
        }
    }
}

#[async_trait]
impl Broadcaster for BroadcastGateway {
    async fn publish(&self, request: PublishRequest) -> Result<PublishAck, BroadcastError> {
        // captured once; signing and the query both use it
        let timestamp = chrono::Utc::now().timestamp();
        self.publish_at(&request, timestamp).await
    }
}

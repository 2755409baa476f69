//! Business logic: request signing and the broadcast gateway.

pub mod gateway;
pub mod observer;
pub mod signer;

pub use gateway::{BroadcastGateway, Broadcaster, DEFAULT_TIMEOUT};
pub use observer::{BroadcastObserver, GatewayEvent, TracingObserver};
pub use signer::{SignedCall, SignedRequestBuilder};

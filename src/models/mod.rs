//! Data models for publish requests, channels, and credentials.

pub mod channel;
pub mod credentials;
pub mod event;

pub use channel::*;
pub use credentials::*;
pub use event::*;

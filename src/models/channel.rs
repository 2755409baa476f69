//! Channel naming rules for the events API.

use crate::error::BroadcastError;

/// Longest channel name the events API accepts.
pub const MAX_CHANNEL_NAME_LEN: usize = 164;
/// Most channels a single publish may target.
pub const MAX_CHANNELS_PER_EVENT: usize = 100;

/// Pusher-style: `[A-Za-z0-9_\-=@,.;]`.
fn is_channel_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '=' | '@' | ',' | '.' | ';')
}

/// Validate a single channel name.
pub fn validate_channel_name(name: &str) -> Result<(), BroadcastError> {
    if name.is_empty() {
        return Err(BroadcastError::InvalidRequest(
            "channel name is empty".to_string(),
        ));
    }
    if name.len() > MAX_CHANNEL_NAME_LEN {
        return Err(BroadcastError::InvalidRequest(format!(
            "channel name longer than {} bytes",
            MAX_CHANNEL_NAME_LEN
        )));
    }
    if let Some(bad) = name.chars().find(|c| !is_channel_char(*c)) {
        return Err(BroadcastError::InvalidRequest(format!(
            "channel {:?} contains invalid character {:?}",
            name, bad
        )));
    }
    Ok(())
}

/// Validate the channel list of a publish: non-empty, bounded, every name valid.
pub fn validate_channels(channels: &[String]) -> Result<(), BroadcastError> {
    if channels.is_empty() {
        return Err(BroadcastError::InvalidRequest(
            "channel list is empty".to_string(),
        ));
    }
    if channels.len() > MAX_CHANNELS_PER_EVENT {
        return Err(BroadcastError::InvalidRequest(format!(
            "at most {} channels per event",
            MAX_CHANNELS_PER_EVENT
        )));
    }
    channels.iter().try_for_each(|c| validate_channel_name(c))
}

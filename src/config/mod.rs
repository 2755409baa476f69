//! Application configuration loaded from environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::BroadcastError;
use crate::models::credentials::{ApiKey, Credentials, Scheme, Target};

/// Application configuration loaded from `.env` and environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g. `0.0.0.0:3000`).
    pub server_addr: SocketAddr,
    /// Redis connection URL used by the health check (e.g. `redis://127.0.0.1/`).
    pub redis_url: String,
    /// Events API credentials (`PUSHER_APP_ID`, `PUSHER_APP_KEY`, `PUSHER_APP_SECRET`).
    pub credentials: Credentials,
    /// Events API location (`PUSHER_SCHEME`, `PUSHER_HOST`, `PUSHER_PORT`).
    pub target: Target,
    /// Key required in `x-app-key` for `POST /api/broadcast` (`BROADCAST_API_KEY`).
    /// Unset disables the route.
    pub api_key: Option<ApiKey>,
    /// Outbound publish timeout (`PUSHER_TIMEOUT_SECS`).
    pub timeout: Duration,
    /// Log level: `error`, `warn`, `info`, `debug`, `trace`.
    pub log_level: String,
    /// Directory holding `websockets-test.html`.
    pub static_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment. Call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from any variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigLoadError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigLoadError::Missing(name));

        let server_addr: SocketAddr = get("SERVER_ADDR")
            .unwrap_or_else(|| "0.0.0.0:3000".to_string())
            .parse()
            .map_err(|_| ConfigLoadError::Invalid("SERVER_ADDR"))?;
        let redis_url = get("REDIS_URL").unwrap_or_else(|| "redis://127.0.0.1/".to_string());

        let credentials = Credentials::new(
            required("PUSHER_APP_ID")?,
            required("PUSHER_APP_KEY")?,
            required("PUSHER_APP_SECRET")?,
        )
        .map_err(|_| ConfigLoadError::Invalid("PUSHER_APP_*"))?;

        let scheme: Scheme = get("PUSHER_SCHEME")
            .unwrap_or_else(|| "http".to_string())
            .parse()
            .map_err(|_| ConfigLoadError::Invalid("PUSHER_SCHEME"))?;
        let port: u16 = get("PUSHER_PORT")
            .unwrap_or_else(|| "6001".to_string())
            .trim()
            .parse()
            .map_err(|_| ConfigLoadError::Invalid("PUSHER_PORT"))?;
        let target = Target::new(scheme, required("PUSHER_HOST")?, port)
            .map_err(|_| ConfigLoadError::Invalid("PUSHER_HOST"))?;

        let timeout_secs: u64 = get("PUSHER_TIMEOUT_SECS")
            .unwrap_or_else(|| "5".to_string())
            .trim()
            .parse()
            .map_err(|_| ConfigLoadError::Invalid("PUSHER_TIMEOUT_SECS"))?;
        if timeout_secs == 0 {
            return Err(ConfigLoadError::Invalid("PUSHER_TIMEOUT_SECS"));
        }

        let api_key = get("BROADCAST_API_KEY").and_then(ApiKey::new);
        let log_level = get("LOG_LEVEL").unwrap_or_else(|| "info".to_string());
        let static_dir = PathBuf::from(get("STATIC_DIR").unwrap_or_else(|| "static".to_string()));

        Ok(Self {
            server_addr,
            redis_url,
            credentials,
            target,
            api_key,
            timeout: Duration::from_secs(timeout_secs),
            log_level,
            static_dir,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("missing required variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {0}")]
    Invalid(&'static str),
}

impl From<ConfigLoadError> for BroadcastError {
    fn from(e: ConfigLoadError) -> Self {
        BroadcastError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    const MINIMAL: &[(&str, &str)] = &[
        ("PUSHER_APP_ID", "1"),
        ("PUSHER_APP_KEY", "local"),
        ("PUSHER_APP_SECRET", "shh"),
        ("PUSHER_HOST", "127.0.0.1"),
    ];

    #[test]
    fn defaults_apply() {
        let config = Config::from_lookup(env(MINIMAL)).unwrap();
        assert_eq!(config.server_addr.port(), 3000);
        assert_eq!(config.target.port, 6001);
        assert_eq!(config.target.scheme, Scheme::Http);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.credentials.key(), "local");
        assert!(config.api_key.is_none());
    }

    #[test]
    fn api_key_is_loaded_and_hidden() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push(("BROADCAST_API_KEY", "server-side-key"));
        let config = Config::from_lookup(env(&pairs)).unwrap();
        assert!(config.api_key.as_ref().unwrap().matches("server-side-key"));
        assert!(!format!("{:?}", config).contains("server-side-key"));
    }

    #[test]
    fn missing_secret_is_reported_by_name() {
        let pairs: Vec<_> = MINIMAL
            .iter()
            .copied()
            .filter(|(k, _)| *k != "PUSHER_APP_SECRET")
            .collect();
        match Config::from_lookup(env(&pairs)) {
            Err(ConfigLoadError::Missing(name)) => assert_eq!(name, "PUSHER_APP_SECRET"),
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn empty_host_counts_as_missing() {
        let mut pairs = MINIMAL.to_vec();
        pairs.retain(|(k, _)| *k != "PUSHER_HOST");
        pairs.push(("PUSHER_HOST", ""));
        assert!(matches!(
            Config::from_lookup(env(&pairs)),
            Err(ConfigLoadError::Missing("PUSHER_HOST"))
        ));
    }

    #[test]
    fn bad_port_and_scheme_rejected() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push(("PUSHER_PORT", "http"));
        assert!(matches!(
            Config::from_lookup(env(&pairs)),
            Err(ConfigLoadError::Invalid("PUSHER_PORT"))
        ));

        let mut pairs = MINIMAL.to_vec();
        pairs.push(("PUSHER_SCHEME", "ftp"));
        assert!(matches!(
            Config::from_lookup(env(&pairs)),
            Err(ConfigLoadError::Invalid("PUSHER_SCHEME"))
        ));
    }

    #[test]
    fn debug_hides_secret() {
        let config = Config::from_lookup(env(MINIMAL)).unwrap();
        assert!(!format!("{:?}", config).contains("shh"));
    }

    #[test]
    fn config_error_converts() {
        let err: BroadcastError = ConfigLoadError::Missing("PUSHER_HOST").into();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
    }
}

//! Application credentials and upstream target for the events API.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::BroadcastError;

/// Pusher-style app credentials. The secret is never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    app_id: String,
    key: String,
    secret: String,
}

impl Credentials {
    /// All three parts must be non-empty.
    pub fn new(
        app_id: impl Into<String>,
        key: impl Into<String>,
        secret: impl Into<String>,
    ) -> Result<Self, BroadcastError> {
        let creds = Self {
            app_id: app_id.into(),
            key: key.into(),
            secret: secret.into(),
        };
        for (name, value) in [
            ("app_id", &creds.app_id),
            ("key", &creds.key),
            ("secret", &creds.secret),
        ] {
            if value.trim().is_empty() {
                return Err(BroadcastError::Config(format!("credential {} is empty", name)));
            }
        }
        Ok(creds)
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("app_id", &self.app_id)
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Server-side key callers present in `x-app-key` to use the generic publish route.
/// Distinct from the Pusher app key, which is public.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// `None` for an empty key.
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            None
        } else {
            Some(Self(key))
        }
    }

    /// Compares without short-circuiting on the first differing byte.
    pub fn matches(&self, candidate: &str) -> bool {
        let expected = self.0.as_bytes();
        let candidate = candidate.as_bytes();
        if expected.len() != candidate.len() {
            return false;
        }
        expected
            .iter()
            .zip(candidate)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// URL scheme of the upstream events API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl FromStr for Scheme {
    type Err = BroadcastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            other => Err(BroadcastError::Config(format!("unsupported scheme: {}", other))),
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the events API lives: `{scheme}://{host}:{port}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
}

impl Target {
    pub fn new(scheme: Scheme, host: impl Into<String>, port: u16) -> Result<Self, BroadcastError> {
        let host = host.into();
        if host.trim().is_empty() {
            return Err(BroadcastError::Config("host is empty".to_string()));
        }
        Ok(Self { scheme, host, port })
    }

    /// Base URL without a trailing slash, e.g. `http://127.0.0.1:6001`.
    /// IPv6 literals are bracketed: `http://[::1]:6001`.
    pub fn base_url(&self) -> String {
        let host = self.host.trim();
        if host.contains(':') && !host.starts_with('[') {
            format!("{}://[{}]:{}", self.scheme, host, self.port)
        } else {
            format!("{}://{}:{}", self.scheme, host, self.port)
        }
    }
}

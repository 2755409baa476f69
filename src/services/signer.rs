//! Signed publish requests for the Pusher HTTP events API.
//!
//! The signature is HMAC-SHA256(secret, "POST\n{path}\n{sorted query}") where the
//! query holds `auth_key`, `auth_timestamp`, `auth_version` and `body_md5`, joined
//! raw (no percent-encoding). The final URL carries the same parameters plus
//! `auth_signature`, form-urlencoded.

use crate::error::BroadcastError;
use crate::models::credentials::{Credentials, Target};
use crate::models::event::PublishRequest;
use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use serde::Serialize;
use sha2::Sha256;
use std::collections::BTreeMap;

type HmacSha256 = Hmac<Sha256>;

pub const AUTH_VERSION: &str = "1.0";
pub const METHOD: &str = "POST";

/// A fully signed publish call. Built per publish, dropped after use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedCall {
    pub method: &'static str,
    pub path: String,
    /// Signed parameters, sorted by key. Does not include `auth_signature`.
    pub query_params: BTreeMap<String, String>,
    pub signature: String,
    /// Exact JSON body that `body_md5` covers; must be sent byte for byte.
    pub body: String,
    pub url: String,
    pub timestamp: i64,
}

impl SignedCall {
    pub fn body_md5(&self) -> Option<&str> {
        self.query_params.get("body_md5").map(String::as_str)
    }
}

/// Wire body; `data` is the payload JSON-encoded into a string.
#[derive(Serialize)]
struct EventBody<'a> {
    name: &'a str,
    channels: &'a [String],
    data: String,
}

/// `{"name":…,"channels":[…],"data":"<payload as JSON string>"}`, compact.
pub fn encode_body(request: &PublishRequest) -> Result<String, BroadcastError> {
    let body = EventBody {
        name: request.event(),
        channels: request.channels(),
        data: serde_json::to_string(request.payload())?,
    };
    Ok(serde_json::to_string(&body)?)
}

/// Lowercase hex MD5.
pub fn body_md5(body: &str) -> String {
    hex::encode(Md5::digest(body.as_bytes()))
}

/// `k=v` pairs joined by `&` in key order, values left unencoded.
pub fn canonical_query(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

pub fn string_to_sign(path: &str, query: &str) -> String {
    format!("{}\n{}\n{}", METHOD, path, query)
}

/// Lowercase hex HMAC-SHA256.
pub fn hmac_hex(secret: &str, message: &str) -> Result<String, BroadcastError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| BroadcastError::Signing(format!("HMAC init: {}", e)))?;
    mac.update(message.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Builds [`SignedCall`]s for one app. Holds no mutable state.
#[derive(Debug, Clone)]
pub struct SignedRequestBuilder {
    credentials: Credentials,
    target: Target,
}

impl SignedRequestBuilder {
    pub fn new(credentials: Credentials, target: Target) -> Self {
        Self {
            credentials,
            target,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// `/apps/{app_id}/events`
    pub fn path(&self) -> String {
        format!("/apps/{}/events", self.credentials.app_id())
    }

    /// Sign `request` at `timestamp` (Unix seconds). Pure: same inputs, same call.
    pub fn build(
        &self,
        request: &PublishRequest,
        timestamp: i64,
    ) -> Result<SignedCall, BroadcastError> {
        if request.channels().is_empty() {
            return Err(BroadcastError::InvalidRequest(
                "channel list is empty".to_string(),
            ));
        }

        let body = encode_body(request)?;
        let mut params = BTreeMap::new();
        params.insert("auth_key".to_string(), self.credentials.key().to_string());
        params.insert("auth_timestamp".to_string(), timestamp.to_string());
        params.insert("auth_version".to_string(), AUTH_VERSION.to_string());
        if !body.is_empty() {
            params.insert("body_md5".to_string(), body_md5(&body));
        }

        let path = self.path();
        let query = canonical_query(&params);
        let signature = hmac_hex(self.credentials.secret(), &string_to_sign(&path, &query))?;

        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params.iter())
            .append_pair("auth_signature", &signature)
            .finish();
        let url = format!("{}{}?{}", self.target.base_url(), path, encoded);

        Ok(SignedCall {
            method: METHOD,
            path,
            query_params: params,
            signature,
            body,
            url,
            timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::credentials::Scheme;
    use serde_json::json;

    const TS: i64 = 1_700_000_000;

    fn builder(secret: &str) -> SignedRequestBuilder {
        SignedRequestBuilder::new(
            Credentials::new("1", "k", secret).unwrap(),
            Target::new(Scheme::Http, "127.0.0.1", 6001).unwrap(),
        )
    }

    fn hi_request() -> PublishRequest {
        PublishRequest::single("test-channel", "test-event", json!({"message": "hi"})).unwrap()
    }

    #[test]
    fn canonical_query_sorts_keys() {
        let mut params = BTreeMap::new();
        params.insert("auth_version".to_string(), "1.0".to_string());
        params.insert("auth_key".to_string(), "abc".to_string());
        params.insert("auth_timestamp".to_string(), "100".to_string());
        assert_eq!(
            canonical_query(&params),
            "auth_key=abc&auth_timestamp=100&auth_version=1.0"
        );
    }

    #[test]
    fn body_double_encodes_data() {
        let body = encode_body(&hi_request()).unwrap();
        assert_eq!(
            body,
            r#"{"name":"test-event","channels":["test-channel"],"data":"{\"message\":\"hi\"}"}"#
        );
    }

    #[test]
    fn known_vector() {
        let call = builder("s").build(&hi_request(), TS).unwrap();
        assert_eq!(call.body_md5(), Some("db53c9eade349840eeda883968967cd0"));
        assert_eq!(
            call.signature,
            "807af982203b5740e70a0b22a962e2f42283daf87bf5674308c38e194e7d72dc"
        );
        assert_eq!(call.path, "/apps/1/events");
        assert_eq!(call.method, "POST");
    }

    #[test]
    fn signature_matches_reference_construction() {
        let call = builder("s").build(&hi_request(), TS).unwrap();
        let md5 = body_md5(&call.body);
        let reference = format!(
            "POST\n/apps/1/events\nauth_key=k&auth_timestamp={}&auth_version=1.0&body_md5={}",
            TS, md5
        );
        let mut mac = HmacSha256::new_from_slice(b"s").unwrap();
        mac.update(reference.as_bytes());
        assert_eq!(call.signature, hex::encode(mac.finalize().into_bytes()));
    }

    #[test]
    fn deterministic_for_fixed_inputs() {
        let b = builder("s");
        let first = b.build(&hi_request(), TS).unwrap();
        let second = b.build(&hi_request(), TS).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn any_input_change_changes_signature() {
        let base = builder("s").build(&hi_request(), TS).unwrap().signature;

        let payload = PublishRequest::single("test-channel", "test-event", json!({"message": "hj"}))
            .unwrap();
        let event = PublishRequest::single("test-channel", "test-evenT", json!({"message": "hi"}))
            .unwrap();
        let channel = PublishRequest::single("test-channeL", "test-event", json!({"message": "hi"}))
            .unwrap();

        let variants = [
            builder("s").build(&payload, TS).unwrap().signature,
            builder("s").build(&event, TS).unwrap().signature,
            builder("s").build(&channel, TS).unwrap().signature,
            builder("t").build(&hi_request(), TS).unwrap().signature,
            builder("s").build(&hi_request(), TS + 1).unwrap().signature,
        ];
        for sig in variants {
            assert_ne!(sig, base);
        }
    }

    #[test]
    fn url_carries_encoded_params_and_signature() {
        let creds = Credentials::new("42", "a key", "s").unwrap();
        let target = Target::new(Scheme::Https, "ws.example.com", 443).unwrap();
        let call = SignedRequestBuilder::new(creds, target)
            .build(&hi_request(), TS)
            .unwrap();

        assert!(call
            .url
            .starts_with("https://ws.example.com:443/apps/42/events?auth_key=a+key&auth_timestamp=1700000000&auth_version=1.0&body_md5="));
        assert!(call
            .url
            .ends_with(&format!("&auth_signature={}", call.signature)));
        // signing covers the raw value, not the encoded one
        let query = canonical_query(&call.query_params);
        assert!(query.starts_with("auth_key=a key&"));
    }

    #[test]
    fn timestamp_is_reused_in_url() {
        let call = builder("s").build(&hi_request(), 123).unwrap();
        assert_eq!(call.timestamp, 123);
        assert_eq!(call.query_params["auth_timestamp"], "123");
        assert!(call.url.contains("auth_timestamp=123&"));
    }

    #[test]
    fn empty_payload_still_hashes_body() {
        let req = PublishRequest::single("c", "e", json!({})).unwrap();
        let call = builder("s").build(&req, TS).unwrap();
        assert_eq!(call.body, r#"{"name":"e","channels":["c"],"data":"{}"}"#);
        assert_eq!(call.body_md5(), Some(body_md5(&call.body).as_str()));
    }
}

//! Svix-style webhook signature verification.
//!
//! The auth provider delivers webhooks through Svix, which signs each request
//! with HMAC-SHA256 over `"{svix-id}.{svix-timestamp}.{body}"`.
//! Reference: https://docs.svix.com/receiving/verifying-payloads/how-manual

use std::time::{SystemTime, UNIX_EPOCH};

use axum::http::HeaderMap;
use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const HEADER_ID: &str = "svix-id";
pub const HEADER_TIMESTAMP: &str = "svix-timestamp";
pub const HEADER_SIGNATURE: &str = "svix-signature";

const SECRET_PREFIX: &str = "whsec_";
const SIGNATURE_VERSION: &str = "v1";

/// Reasons a webhook fails verification.
#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("webhook secret is not valid base64")]
    InvalidSecret,

    #[error("invalid timestamp header: {0}")]
    InvalidTimestamp(String),

    #[error("timestamp too old ({age_secs}s)")]
    TimestampTooOld { age_secs: i64 },

    #[error("timestamp too new ({skew_secs}s ahead)")]
    TimestampTooNew { skew_secs: i64 },

    #[error("no matching signature found")]
    NoMatchingSignature,

    #[error("payload is not a valid event: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

/// The three verification header values sent with every webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookHeaders {
    pub id: String,
    pub timestamp: String,
    pub signature: String,
}

impl WebhookHeaders {
    /// Extract the verification headers.
    ///
    /// Returns `None` if any of them is absent, empty, or not visible ASCII.
    pub fn from_header_map(headers: &HeaderMap) -> Option<Self> {
        let get = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        Some(Self {
            id: get(HEADER_ID)?,
            timestamp: get(HEADER_TIMESTAMP)?,
            signature: get(HEADER_SIGNATURE)?,
        })
    }
}

/// Verifier holding the decoded signing key.
#[derive(Clone)]
pub struct Webhook {
    key: Vec<u8>,
    tolerance_secs: i64,
}

impl std::fmt::Debug for Webhook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Webhook")
            .field("tolerance_secs", &self.tolerance_secs)
            .finish_non_exhaustive()
    }
}

impl Webhook {
    /// Build a verifier from a `whsec_`-prefixed (or bare) base64 secret.
    pub fn new(secret: &str, tolerance_secs: u64) -> Result<Self, SignatureError> {
        let encoded = secret.trim();
        let encoded = encoded.strip_prefix(SECRET_PREFIX).unwrap_or(encoded);

        let key = STANDARD
            .decode(encoded)
            .map_err(|_| SignatureError::InvalidSecret)?;

        if key.is_empty() {
            return Err(SignatureError::InvalidSecret);
        }

        Ok(Self {
            key,
            tolerance_secs: i64::try_from(tolerance_secs).unwrap_or(i64::MAX),
        })
    }

    /// Verify `payload` against `headers` and decode it as `T`.
    pub fn verify<T: DeserializeOwned>(
        &self,
        payload: &str,
        headers: &WebhookHeaders,
    ) -> Result<T, SignatureError> {
        self.verify_at(payload, headers, unix_now())
    }

    /// Same as [`Webhook::verify`] with an explicit current time.
    pub fn verify_at<T: DeserializeOwned>(
        &self,
        payload: &str,
        headers: &WebhookHeaders,
        now: i64,
    ) -> Result<T, SignatureError> {
        let timestamp: i64 = headers
            .timestamp
            .trim()
            .parse()
            .map_err(|_| SignatureError::InvalidTimestamp(headers.timestamp.clone()))?;

        let age = now.saturating_sub(timestamp);
        if age > self.tolerance_secs {
            return Err(SignatureError::TimestampTooOld { age_secs: age });
        }
        let skew = timestamp.saturating_sub(now);
        if skew > self.tolerance_secs {
            return Err(SignatureError::TimestampTooNew { skew_secs: skew });
        }

        let mac = self.mac(&headers.id, &headers.timestamp, payload)?;

        let matched = headers
            .signature
            .split_whitespace()
            .filter_map(|entry| entry.split_once(','))
            .filter(|(version, _)| *version == SIGNATURE_VERSION)
            .filter_map(|(_, sig)| STANDARD.decode(sig).ok())
            // verify_slice compares in constant time
            .any(|sig| mac.clone().verify_slice(&sig).is_ok());

        if !matched {
            return Err(SignatureError::NoMatchingSignature);
        }

        Ok(serde_json::from_str(payload)?)
    }

    /// Produce a `svix-signature` header value for the given message.
    pub fn sign(&self, msg_id: &str, timestamp: i64, payload: &str) -> Result<String, SignatureError> {
        let mac = self.mac(msg_id, &timestamp.to_string(), payload)?;
        let digest = STANDARD.encode(mac.finalize().into_bytes());
        Ok(format!("{},{}", SIGNATURE_VERSION, digest))
    }

    fn mac(&self, msg_id: &str, timestamp: &str, payload: &str) -> Result<HmacSha256, SignatureError> {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).map_err(|_| SignatureError::InvalidSecret)?;
        mac.update(msg_id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        Ok(mac)
    }
}

/// Current Unix time in seconds.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::Value;

    // Secret from the Svix documentation examples.
    const SECRET: &str = "whsec_MfKQ9r8GKYqrTwjUPD8ILPZIo2LaLaSw";
    const PAYLOAD: &str = r#"{"type":"user.created","data":{"id":"user_1"}}"#;

    fn webhook() -> Webhook {
        Webhook::new(SECRET, 300).unwrap()
    }

    fn signed_headers(wh: &Webhook, timestamp: i64, payload: &str) -> WebhookHeaders {
        WebhookHeaders {
            id: "msg_p5jXN8AQM9LWM0D4loKWxJek".to_string(),
            timestamp: timestamp.to_string(),
            signature: wh.sign("msg_p5jXN8AQM9LWM0D4loKWxJek", timestamp, payload).unwrap(),
        }
    }

    #[test]
    fn test_known_signature_vector() {
        // Published Svix test vector.
        let wh = webhook();
        let payload = r#"{"test": 2432232314}"#;
        let headers = WebhookHeaders {
            id: "msg_p5jXN8AQM9LWM0D4loKWxJek".to_string(),
            timestamp: "1614265330".to_string(),
            signature: "v1,g0hM9SsE+OTPJTGt/tmIKtSyZlE3uFJELVlNIOLJ1OE=".to_string(),
        };

        assert_eq!(
            wh.sign(&headers.id, 1614265330, payload).unwrap(),
            headers.signature
        );
        let value: Value = wh.verify_at(payload, &headers, 1614265330).unwrap();
        assert_eq!(value["test"], 2432232314u64);
    }

    #[test]
    fn test_verify_valid() {
        let wh = webhook();
        let now = unix_now();
        let headers = signed_headers(&wh, now, PAYLOAD);

        let value: Value = wh.verify(PAYLOAD, &headers).unwrap();
        assert_eq!(value["type"], "user.created");
    }

    #[test]
    fn test_secret_without_prefix() {
        let bare = SECRET.trim_start_matches("whsec_");
        let wh = Webhook::new(bare, 300).unwrap();
        let headers = signed_headers(&webhook(), 1000, PAYLOAD);

        assert!(wh.verify_at::<Value>(PAYLOAD, &headers, 1000).is_ok());
    }

    #[test]
    fn test_invalid_secret() {
        assert!(matches!(
            Webhook::new("whsec_not base64!!", 300),
            Err(SignatureError::InvalidSecret)
        ));
        assert!(matches!(Webhook::new("", 300), Err(SignatureError::InvalidSecret)));
    }

    #[test]
    fn test_tampered_body() {
        let wh = webhook();
        let headers = signed_headers(&wh, 1000, PAYLOAD);
        let tampered = PAYLOAD.replace("user_1", "user_2");

        assert!(matches!(
            wh.verify_at::<Value>(&tampered, &headers, 1000),
            Err(SignatureError::NoMatchingSignature)
        ));
    }

    #[test]
    fn test_wrong_secret() {
        let other = Webhook::new("whsec_dGhpcy1pcy1hbm90aGVyLXNlY3JldA==", 300).unwrap();
        let headers = signed_headers(&other, 1000, PAYLOAD);

        assert!(matches!(
            webhook().verify_at::<Value>(PAYLOAD, &headers, 1000),
            Err(SignatureError::NoMatchingSignature)
        ));
    }

    #[test]
    fn test_multiple_signatures_any_v1_matches() {
        let wh = webhook();
        let mut headers = signed_headers(&wh, 1000, PAYLOAD);
        headers.signature = format!(
            "v1,AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA= v2,junk {}",
            headers.signature
        );

        assert!(wh.verify_at::<Value>(PAYLOAD, &headers, 1000).is_ok());
    }

    #[test]
    fn test_unknown_version_rejected() {
        let wh = webhook();
        let mut headers = signed_headers(&wh, 1000, PAYLOAD);
        headers.signature = headers.signature.replacen("v1,", "v2,", 1);

        assert!(wh.verify_at::<Value>(PAYLOAD, &headers, 1000).is_err());
    }

    #[test]
    fn test_timestamp_tolerance() {
        let wh = webhook();
        let headers = signed_headers(&wh, 1000, PAYLOAD);

        assert!(wh.verify_at::<Value>(PAYLOAD, &headers, 1300).is_ok());
        assert!(matches!(
            wh.verify_at::<Value>(PAYLOAD, &headers, 1301),
            Err(SignatureError::TimestampTooOld { age_secs: 301 })
        ));
        assert!(matches!(
            wh.verify_at::<Value>(PAYLOAD, &headers, 699),
            Err(SignatureError::TimestampTooNew { skew_secs: 301 })
        ));
    }

    #[test]
    fn test_invalid_timestamp() {
        let wh = webhook();
        let mut headers = signed_headers(&wh, 1000, PAYLOAD);
        headers.timestamp = "not-a-number".to_string();

        assert!(matches!(
            wh.verify_at::<Value>(PAYLOAD, &headers, 1000),
            Err(SignatureError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_signed_non_json_payload() {
        let wh = webhook();
        let headers = signed_headers(&wh, 1000, "not json");

        assert!(matches!(
            wh.verify_at::<Value>("not json", &headers, 1000),
            Err(SignatureError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_headers_from_map() {
        let mut map = HeaderMap::new();
        map.insert(HEADER_ID, HeaderValue::from_static("msg_1"));
        map.insert(HEADER_TIMESTAMP, HeaderValue::from_static("1000"));
        assert!(WebhookHeaders::from_header_map(&map).is_none());

        map.insert(HEADER_SIGNATURE, HeaderValue::from_static(""));
        assert!(WebhookHeaders::from_header_map(&map).is_none());

        map.insert(HEADER_SIGNATURE, HeaderValue::from_static("v1,abc"));
        let headers = WebhookHeaders::from_header_map(&map).unwrap();
        assert_eq!(headers.id, "msg_1");
        assert_eq!(headers.signature, "v1,abc");
    }
}

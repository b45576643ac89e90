//! Slack request signature verification.
//!
//! Slack signs every Events API request using HMAC-SHA256.
//! Reference: https://api.slack.com/authentication/verifying-requests-from-slack

use std::time::{SystemTime, UNIX_EPOCH};

use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

use crate::slack::{SIGNATURE_HEADER, TIMESTAMP_HEADER};
use crate::Config;

type HmacSha256 = Hmac<Sha256>;

/// Version prefix of both the base string and the signature.
const SIGNATURE_VERSION: &str = "v0";

/// Verifies inbound requests against the configured signing secret.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: Option<String>,
    allow_unsigned: bool,
    max_age_seconds: u64,
}

impl SignatureVerifier {
    pub fn new(secret: Option<String>, allow_unsigned: bool, max_age_seconds: u64) -> Self {
        Self {
            secret,
            allow_unsigned,
            max_age_seconds,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.slack_signing_secret.clone(),
            config.slack_allow_unsigned,
            config.slack_signature_max_age,
        )
    }

    /// Verify the signature headers of a request against its raw body.
    ///
    /// `now` is the current unix time in seconds. Returns `false` on any
    /// missing or malformed input. Without a signing secret every request is
    /// rejected unless unsigned requests were explicitly allowed.
    pub fn verify(&self, headers: &HeaderMap, raw_body: &[u8], now: i64) -> bool {
        let secret = match self.secret.as_deref() {
            Some(secret) if is_signature_verification_enabled(&self.secret) => secret,
            _ if self.allow_unsigned => {
                warn!("slack_signature_check_bypassed");
                return true;
            }
            _ => {
                warn!("slack_signature_secret_missing");
                return false;
            }
        };

        let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
        let timestamp = headers.get(TIMESTAMP_HEADER).and_then(|v| v.to_str().ok());

        match (signature, timestamp) {
            (Some(signature), Some(timestamp)) => verify_slack_signature(
                secret,
                timestamp,
                signature,
                raw_body,
                now,
                self.max_age_seconds,
            ),
            _ => {
                warn!(
                    has_signature = signature.is_some(),
                    has_timestamp = timestamp.is_some(),
                    "slack_signature_missing_headers"
                );
                false
            }
        }
    }
}

/// Verify a Slack request signature.
///
/// The signature is `v0=` followed by the hex HMAC-SHA256, keyed with the
/// signing secret, of `v0:{timestamp}:{raw_body}`.
///
/// # Arguments
///
/// * `signing_secret` - The app's signing secret
/// * `timestamp` - The `X-Slack-Request-Timestamp` header value
/// * `signature` - The `X-Slack-Signature` header value
/// * `raw_body` - The request body exactly as received
/// * `now` - Current unix time in seconds
/// * `max_age_seconds` - Maximum allowed skew between `timestamp` and `now`
///
/// # Returns
///
/// `true` if the signature matches and the timestamp is within the window.
pub fn verify_slack_signature(
    signing_secret: &str,
    timestamp: &str,
    signature: &str,
    raw_body: &[u8],
    now: i64,
    max_age_seconds: u64,
) -> bool {
    if signing_secret.is_empty() || timestamp.is_empty() || signature.is_empty() {
        warn!(
            has_signing_secret = !signing_secret.is_empty(),
            has_timestamp = !timestamp.is_empty(),
            has_signature = !signature.is_empty(),
            "slack_signature_missing_fields"
        );
        return false;
    }

    // Reject stale or future timestamps (prevents replay attacks)
    let request_time: i64 = match timestamp.parse() {
        Ok(t) => t,
        Err(_) => {
            warn!(timestamp = %timestamp, "slack_signature_invalid_timestamp");
            return false;
        }
    };

    let skew = now.abs_diff(request_time);
    if skew > max_age_seconds {
        warn!(
            request_time = request_time,
            current_time = now,
            skew_seconds = skew,
            max_age_seconds = max_age_seconds,
            "slack_signature_stale"
        );
        return false;
    }

    let expected_signature = match compute_slack_signature(signing_secret, timestamp, raw_body) {
        Some(sig) => sig,
        None => {
            warn!("slack_signature_invalid_key");
            return false;
        }
    };

    // Constant-time comparison to prevent timing attacks
    let valid = constant_time_compare(&expected_signature, signature);

    if !valid {
        warn!(
            expected_length = expected_signature.len(),
            actual_length = signature.len(),
            "slack_signature_mismatch"
        );
    }

    valid
}

/// Compute the `v0=<hex>` signature Slack would send for `raw_body`.
pub fn compute_slack_signature(
    signing_secret: &str,
    timestamp: &str,
    raw_body: &[u8],
) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(signing_secret.as_bytes()).ok()?;

    mac.update(SIGNATURE_VERSION.as_bytes());
    mac.update(b":");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(raw_body);

    Some(format!(
        "{}={}",
        SIGNATURE_VERSION,
        hex::encode(mac.finalize().into_bytes())
    ))
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

/// Check if Slack signature verification is enabled.
pub fn is_signature_verification_enabled(signing_secret: &Option<String>) -> bool {
    signing_secret
        .as_ref()
        .map(|k| !k.trim().is_empty())
        .unwrap_or(false)
}

/// Current unix time in seconds.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

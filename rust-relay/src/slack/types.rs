//! Slack Events API payload types.
//!
//! This module defines the envelopes Slack POSTs to the events endpoint:
//! - `url_verification`: one-time handshake carrying a challenge
//! - `event_callback`: wraps an inner event such as a channel message
//!
//! Anything else decodes to [`EventEnvelope::Other`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

/// Header carrying the `v0=<hex>` request signature.
pub const SIGNATURE_HEADER: &str = "x-slack-signature";

/// Header carrying the unix timestamp the signature was computed over.
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";

/// Header set on redeliveries, counting previous attempts.
pub const RETRY_NUM_HEADER: &str = "x-slack-retry-num";

/// Header set on redeliveries, naming why Slack retried.
pub const RETRY_REASON_HEADER: &str = "x-slack-retry-reason";

/// Top-level Events API envelope, discriminated by its `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EventEnvelope {
    /// Endpoint ownership handshake
    #[serde(rename = "url_verification")]
    UrlVerification {
        #[serde(default)]
        challenge: String,
    },
    /// Wrapper around a workspace event
    #[serde(rename = "event_callback")]
    EventCallback {
        #[serde(default)]
        event: MessageEvent,
    },
    /// Envelope types this relay does not act on
    #[serde(other)]
    Other,
}

impl EventEnvelope {
    /// Decode an envelope from an already-parsed JSON document.
    ///
    /// Documents without a `type` or with unexpected field shapes are
    /// treated as [`EventEnvelope::Other`] rather than as errors, so they are
    /// still acknowledged.
    pub fn from_value(value: Value) -> Self {
        match serde_json::from_value(value) {
            Ok(envelope) => envelope,
            Err(e) => {
                debug!(error = %e, "slack_envelope_unrecognised");
                EventEnvelope::Other
            }
        }
    }
}

/// Inner event of an `event_callback` envelope.
///
/// Only the fields needed for forwarding are kept. Every field defaults so
/// that non-message events (reactions, joins) still decode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageEvent {
    /// Event type, e.g. "message"
    #[serde(default, rename = "type")]
    pub event_type: String,
    /// Present for edits, bot posts, joins and other non-user messages.
    /// A key present with a `null` value decodes to `Some(Value::Null)`.
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub subtype: Option<Value>,
    /// Channel the message was posted in
    #[serde(default, rename = "channel")]
    pub channel_id: String,
    /// Author of the message
    #[serde(default, rename = "user")]
    pub user_id: String,
    /// Message text
    #[serde(default)]
    pub text: String,
    /// Message timestamp, Slack's message identifier within a channel
    #[serde(default, rename = "ts")]
    pub timestamp_token: String,
}

impl MessageEvent {
    /// Whether this is an ordinary user-authored message: a `message` event
    /// with no `subtype` key at all.
    pub fn is_plain_message(&self) -> bool {
        self.event_type == "message" && self.subtype.is_none()
    }
}

/// Record a field as present whatever its value, `null` included.
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_url_verification() {
        let envelope = EventEnvelope::from_value(json!({
            "token": "Jhj5dZrVaK7ZwHHjRyZWjbDl",
            "challenge": "3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P",
            "type": "url_verification"
        }));

        assert_eq!(
            envelope,
            EventEnvelope::UrlVerification {
                challenge: "3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P".to_string()
            }
        );
    }

    #[test]
    fn test_decode_message_event() {
        let envelope = EventEnvelope::from_value(json!({
            "type": "event_callback",
            "team_id": "T061EG9R6",
            "event": {
                "type": "message",
                "channel": "C2147483705",
                "user": "U2147483697",
                "text": "Hello world",
                "ts": "1355517523.000005"
            }
        }));

        let EventEnvelope::EventCallback { event } = envelope else {
            panic!("expected event_callback");
        };
        assert_eq!(event.channel_id, "C2147483705");
        assert_eq!(event.user_id, "U2147483697");
        assert_eq!(event.timestamp_token, "1355517523.000005");
        assert!(event.is_plain_message());
    }

    #[test]
    fn test_subtype_makes_message_ineligible() {
        let event: MessageEvent = serde_json::from_value(json!({
            "type": "message",
            "subtype": "message_changed",
            "channel": "C1"
        }))
        .unwrap();

        assert!(!event.is_plain_message());
    }

    #[test]
    fn test_null_subtype_makes_message_ineligible() {
        let envelope = EventEnvelope::from_value(json!({
            "type": "event_callback",
            "event": {
                "type": "message",
                "subtype": null,
                "channel": "C1",
                "ts": "1.2"
            }
        }));

        let EventEnvelope::EventCallback { event } = envelope else {
            panic!("expected event_callback");
        };
        assert_eq!(event.subtype, Some(Value::Null));
        assert!(!event.is_plain_message());
    }

    #[test]
    fn test_absent_subtype_is_none() {
        let event: MessageEvent =
            serde_json::from_value(json!({"type": "message", "channel": "C1"})).unwrap();
        assert_eq!(event.subtype, None);
        assert!(event.is_plain_message());
    }

    #[test]
    fn test_unknown_type_is_other() {
        let envelope = EventEnvelope::from_value(json!({
            "type": "app_rate_limited",
            "minute_rate_limited": 1518467820
        }));
        assert_eq!(envelope, EventEnvelope::Other);
    }

    #[test]
    fn test_missing_type_is_other() {
        assert_eq!(EventEnvelope::from_value(json!({"hello": "world"})), EventEnvelope::Other);
        assert_eq!(EventEnvelope::from_value(json!([1, 2, 3])), EventEnvelope::Other);
    }

    #[test]
    fn test_malformed_event_fields_are_other() {
        let envelope = EventEnvelope::from_value(json!({
            "type": "event_callback",
            "event": { "type": "message", "channel": 42 }
        }));
        assert_eq!(envelope, EventEnvelope::Other);
    }

    #[test]
    fn test_url_verification_without_challenge() {
        let envelope = EventEnvelope::from_value(json!({"type": "url_verification"}));
        assert_eq!(
            envelope,
            EventEnvelope::UrlVerification {
                challenge: String::new()
            }
        );
    }
}

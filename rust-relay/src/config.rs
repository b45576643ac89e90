//! Configuration module for environment variable parsing.
//!
//! Everything is read once at startup into an immutable [`Config`] which is
//! then handed to the verifier, the dispatcher and the Slack client.

use std::env;
use std::time::Duration;

use tracing::warn;

/// Default Slack Web API base URL.
pub const DEFAULT_SLACK_API_BASE_URL: &str = "https://slack.com/api/";

/// Default first line of a forwarded post.
pub const DEFAULT_FORWARD_MESSAGE_PREFIX: &str = "New message in the monitored channel:";

/// Default largest request body accepted on the events endpoint.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Largest request body accepted on the events endpoint
    pub max_body_bytes: usize,

    /// Slack signing secret used as the HMAC key
    pub slack_signing_secret: Option<String>,

    /// Accept unsigned requests when no signing secret is configured
    pub slack_allow_unsigned: bool,

    /// Maximum allowed skew in seconds between request timestamp and now
    pub slack_signature_max_age: u64,

    /// Bot token for the Slack Web API
    pub slack_bot_token: Option<String>,

    /// Base URL of the Slack Web API (overridable for testing)
    pub slack_api_base_url: String,

    /// Per-request timeout for Slack Web API calls in milliseconds
    pub slack_request_timeout_ms: u64,

    /// Channel whose messages are inspected for forwarding
    pub monitor_channel_id: Option<String>,

    /// Channel that receives forwarded permalinks
    pub target_channel_id: Option<String>,

    /// Optional keyword list; when absent every eligible message is forwarded
    pub forward_keywords: Option<Vec<String>>,

    /// First line of the forwarded post, followed by the permalink
    pub forward_message_prefix: String,

    /// Upper bound on the whole forwarding step in milliseconds
    pub forward_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            slack_signing_secret: None,
            slack_allow_unsigned: false,
            slack_signature_max_age: 300,
            slack_bot_token: None,
            slack_api_base_url: DEFAULT_SLACK_API_BASE_URL.to_string(),
            slack_request_timeout_ms: 2000,
            monitor_channel_id: None,
            target_channel_id: None,
            forward_keywords: None,
            forward_message_prefix: DEFAULT_FORWARD_MESSAGE_PREFIX.to_string(),
            forward_timeout_ms: 2500,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Config::default();

        Config {
            port: parse_number("PORT", defaults.port),

            max_body_bytes: parse_number("MAX_BODY_BYTES", defaults.max_body_bytes),

            slack_signing_secret: parse_optional("SLACK_SIGNING_SECRET"),

            slack_allow_unsigned: parse_bool("SLACK_ALLOW_UNSIGNED", defaults.slack_allow_unsigned),

            slack_signature_max_age: parse_number(
                "SLACK_SIGNATURE_MAX_AGE",
                defaults.slack_signature_max_age,
            ),

            slack_bot_token: parse_optional("SLACK_BOT_TOKEN"),

            slack_api_base_url: parse_optional("SLACK_API_BASE_URL")
                .unwrap_or(defaults.slack_api_base_url),

            slack_request_timeout_ms: parse_number(
                "SLACK_REQUEST_TIMEOUT_MS",
                defaults.slack_request_timeout_ms,
            ),

            monitor_channel_id: parse_optional("MONITOR_CHANNEL_ID"),

            target_channel_id: parse_optional("TARGET_CHANNEL_ID"),

            forward_keywords: parse_csv("FORWARD_KEYWORDS").filter(|k| !k.is_empty()),

            forward_message_prefix: env::var("FORWARD_MESSAGE_PREFIX")
                .unwrap_or(defaults.forward_message_prefix),

            forward_timeout_ms: parse_number("FORWARD_TIMEOUT_MS", defaults.forward_timeout_ms),
        }
    }

    pub fn slack_request_timeout(&self) -> Duration {
        Duration::from_millis(self.slack_request_timeout_ms)
    }

    pub fn forward_timeout(&self) -> Duration {
        Duration::from_millis(self.forward_timeout_ms)
    }

    /// Log a warning for every setting whose absence degrades the relay.
    pub fn warn_missing(&self) {
        if self.slack_signing_secret.is_none() {
            if self.slack_allow_unsigned {
                warn!("slack_signature_verification_disabled");
            } else {
                warn!(env_var = "SLACK_SIGNING_SECRET", "config_missing_all_requests_rejected");
            }
        }
        if self.slack_bot_token.is_none() {
            warn!(env_var = "SLACK_BOT_TOKEN", "config_missing_forwarding_disabled");
        }
        if self.monitor_channel_id.is_none() {
            warn!(env_var = "MONITOR_CHANNEL_ID", "config_missing_no_channel_monitored");
        }
        if self.target_channel_id.is_none() {
            warn!(env_var = "TARGET_CHANNEL_ID", "config_missing_forwarding_disabled");
        }
    }
}

/// Read a variable, treating empty or whitespace-only values as unset.
fn parse_optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a numeric variable, falling back to `default` when unset or invalid.
fn parse_number<T: std::str::FromStr>(name: &str, default: T) -> T {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid number, using default");
            default
        }
    }
}

/// Parse a boolean flag such as "true", "1" or "yes".
fn parse_bool(name: &str, default: bool) -> bool {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" | "" => false,
        _ => {
            warn!(env_var = name, value = %raw, "Invalid boolean, using default");
            default
        }
    }
}

/// Parse a comma-separated list of strings.
fn parse_csv(name: &str) -> Option<Vec<String>> {
    env::var(name).ok().map(|raw| {
        raw.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number_valid() {
        env::set_var("TEST_RELAY_NUMBER", " 450 ");
        assert_eq!(parse_number("TEST_RELAY_NUMBER", 300u64), 450);
        env::remove_var("TEST_RELAY_NUMBER");
    }

    #[test]
    fn test_parse_number_invalid_uses_default() {
        env::set_var("TEST_RELAY_NUMBER_BAD", "five minutes");
        assert_eq!(parse_number("TEST_RELAY_NUMBER_BAD", 300u64), 300);
        env::remove_var("TEST_RELAY_NUMBER_BAD");
    }

    #[test]
    fn test_parse_bool() {
        env::set_var("TEST_RELAY_BOOL", "TRUE");
        assert!(parse_bool("TEST_RELAY_BOOL", false));
        env::set_var("TEST_RELAY_BOOL", "no");
        assert!(!parse_bool("TEST_RELAY_BOOL", true));
        env::set_var("TEST_RELAY_BOOL", "maybe");
        assert!(parse_bool("TEST_RELAY_BOOL", true));
        env::remove_var("TEST_RELAY_BOOL");
        assert!(!parse_bool("TEST_RELAY_BOOL", false));
    }

    #[test]
    fn test_parse_optional_blank_is_none() {
        env::set_var("TEST_RELAY_OPTIONAL", "   ");
        assert_eq!(parse_optional("TEST_RELAY_OPTIONAL"), None);
        env::set_var("TEST_RELAY_OPTIONAL", " C123 ");
        assert_eq!(parse_optional("TEST_RELAY_OPTIONAL"), Some("C123".to_string()));
        env::remove_var("TEST_RELAY_OPTIONAL");
    }

    #[test]
    fn test_parse_csv() {
        env::set_var("TEST_RELAY_CSV", "deploy, outage,, incident ");
        let result = parse_csv("TEST_RELAY_CSV");
        assert_eq!(
            result,
            Some(vec![
                "deploy".to_string(),
                "outage".to_string(),
                "incident".to_string()
            ])
        );
        env::remove_var("TEST_RELAY_CSV");
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.slack_signature_max_age, 300);
        assert_eq!(config.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
        assert!(!config.slack_allow_unsigned);
        assert_eq!(config.forward_timeout(), Duration::from_millis(2500));
        assert_eq!(config.slack_api_base_url, DEFAULT_SLACK_API_BASE_URL);
    }
}

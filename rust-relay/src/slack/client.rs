//! Slack Web API client.
//!
//! Only the two methods the relay needs are implemented:
//! `chat.getPermalink` and `chat.postMessage`. The [`SlackApi`] trait sits in
//! front of the HTTP client so the dispatcher can be exercised with fakes.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

/// Errors returned by Slack Web API calls.
#[derive(Debug, Error)]
pub enum SlackApiError {
    /// Transport failure, timeout or undecodable response
    #[error("slack request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Slack answered with `ok: false`
    #[error("slack api error: {error}")]
    Api {
        error: String,
        needed: Option<String>,
        provided: Option<String>,
    },

    /// `chat.getPermalink` succeeded without returning a permalink
    #[error("slack returned no permalink")]
    MissingPermalink,

    /// The configured base URL cannot be joined with a method name
    #[error("invalid slack api url: {0}")]
    Url(#[from] url::ParseError),
}

/// Outbound calls the dispatcher makes against the messaging platform.
#[async_trait]
pub trait SlackApi: Send + Sync {
    /// Resolve the permalink of the message `message_ts` in `channel`.
    async fn get_permalink(&self, channel: &str, message_ts: &str) -> Result<String, SlackApiError>;

    /// Post `text` to `channel`.
    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        unfurl_links: bool,
    ) -> Result<(), SlackApiError>;
}

/// Common shape of every Web API response.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    needed: Option<String>,
    #[serde(default)]
    provided: Option<String>,
    #[serde(default)]
    permalink: Option<String>,
}

impl ApiResponse {
    fn into_result(self) -> Result<Self, SlackApiError> {
        if self.ok {
            Ok(self)
        } else {
            Err(SlackApiError::Api {
                error: self.error.unwrap_or_else(|| "unknown_error".to_string()),
                needed: self.needed,
                provided: self.provided,
            })
        }
    }
}

#[derive(Debug, Serialize)]
struct PostMessageRequest<'a> {
    channel: &'a str,
    text: &'a str,
    unfurl_links: bool,
}

/// Bot-token authenticated HTTP client for the Slack Web API.
#[derive(Clone)]
pub struct SlackClient {
    http: Client,
    base_url: Url,
    token: String,
}

impl SlackClient {
    /// Create a client for `base_url` (e.g. `https://slack.com/api/`).
    pub fn new(base_url: &str, token: String, timeout: Duration) -> Result<Self, SlackApiError> {
        // Url::join drops the last path segment unless it ends with a slash.
        let base_url = if base_url.ends_with('/') {
            Url::parse(base_url)?
        } else {
            Url::parse(&format!("{}/", base_url))?
        };

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(SlackApiError::Http)?;

        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    fn method_url(&self, method: &str) -> Result<Url, SlackApiError> {
        Ok(self.base_url.join(method)?)
    }
}

#[async_trait]
impl SlackApi for SlackClient {
    async fn get_permalink(&self, channel: &str, message_ts: &str) -> Result<String, SlackApiError> {
        let url = self.method_url("chat.getPermalink")?;
        debug!(channel = %channel, message_ts = %message_ts, "slack_permalink_requesting");

        let response: ApiResponse = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .query(&[("channel", channel), ("message_ts", message_ts)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .into_result()?
            .permalink
            .filter(|p| !p.is_empty())
            .ok_or(SlackApiError::MissingPermalink)
    }

    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        unfurl_links: bool,
    ) -> Result<(), SlackApiError> {
        let url = self.method_url("chat.postMessage")?;

        let response: ApiResponse = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(&PostMessageRequest {
                channel,
                text,
                unfurl_links,
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response.into_result()?;

        info!(channel = %channel, text_length = text.len(), "slack_message_posted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_url_with_trailing_slash() {
        let client =
            SlackClient::new("https://slack.com/api/", "xoxb-test".into(), Duration::from_secs(1))
                .unwrap();
        assert_eq!(
            client.method_url("chat.postMessage").unwrap().as_str(),
            "https://slack.com/api/chat.postMessage"
        );
    }

    #[test]
    fn test_method_url_without_trailing_slash() {
        let client =
            SlackClient::new("http://127.0.0.1:9000/api", "xoxb-test".into(), Duration::from_secs(1))
                .unwrap();
        assert_eq!(
            client.method_url("chat.getPermalink").unwrap().as_str(),
            "http://127.0.0.1:9000/api/chat.getPermalink"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let result = SlackClient::new("not a url", "xoxb-test".into(), Duration::from_secs(1));
        assert!(matches!(result, Err(SlackApiError::Url(_))));
    }

    #[test]
    fn test_api_response_ok_with_permalink() {
        let response: ApiResponse = serde_json::from_str(
            r#"{"ok":true,"channel":"C1H9RESGA","permalink":"https://ghostbusters.slack.com/archives/C1H9RESGA/p135854651500008"}"#,
        )
        .unwrap();

        let response = response.into_result().unwrap();
        assert_eq!(
            response.permalink.as_deref(),
            Some("https://ghostbusters.slack.com/archives/C1H9RESGA/p135854651500008")
        );
    }

    #[test]
    fn test_api_response_scope_error() {
        let response: ApiResponse = serde_json::from_str(
            r#"{"ok":false,"error":"missing_scope","needed":"chat:write","provided":"channels:history"}"#,
        )
        .unwrap();

        match response.into_result() {
            Err(SlackApiError::Api {
                error,
                needed,
                provided,
            }) => {
                assert_eq!(error, "missing_scope");
                assert_eq!(needed.as_deref(), Some("chat:write"));
                assert_eq!(provided.as_deref(), Some("channels:history"));
            }
            other => panic!("expected api error, got {:?}", other.map(|r| r.ok)),
        }
    }

    #[test]
    fn test_api_response_error_without_code() {
        let response: ApiResponse = serde_json::from_str(r#"{"ok":false}"#).unwrap();
        let err = response.into_result().unwrap_err();
        assert_eq!(err.to_string(), "slack api error: unknown_error");
    }

    #[test]
    fn test_post_message_request_shape() {
        let body = serde_json::to_value(PostMessageRequest {
            channel: "C123",
            text: "hello",
            unfurl_links: true,
        })
        .unwrap();

        assert_eq!(
            body,
            serde_json::json!({"channel": "C123", "text": "hello", "unfurl_links": true})
        );
    }
}

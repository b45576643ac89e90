//! Event dispatcher.
//!
//! Turns a verified [`EventEnvelope`] into an [`Action`] for the web layer,
//! performing the permalink forward as a side effect when a message from the
//! monitored channel qualifies.
//!
//! ```text
//! EventEnvelope → handle() → filter → classify → getPermalink → postMessage
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::error::RelayError;
use crate::relay::classifier::{AcceptAll, Classifier, KeywordClassifier};
use crate::slack::{EventEnvelope, MessageEvent, SlackApi, SlackApiError, SlackClient};
use crate::Config;

/// Read-only settings the dispatcher needs from [`Config`].
#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub monitor_channel_id: Option<String>,
    pub target_channel_id: Option<String>,
    pub message_prefix: String,
    pub forward_timeout: Duration,
}

impl From<&Config> for RelaySettings {
    fn from(config: &Config) -> Self {
        Self {
            monitor_channel_id: config.monitor_channel_id.clone(),
            target_channel_id: config.target_channel_id.clone(),
            message_prefix: config.forward_message_prefix.clone(),
            forward_timeout: config.forward_timeout(),
        }
    }
}

/// A post that was made into the target channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardAction {
    pub permalink: String,
    pub target_channel: String,
    pub message: String,
}

/// What happened to an acknowledged envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Not a plain message from the monitored channel, or not a message at all
    Ignored,
    /// Eligible, but the classifier declined it
    Declined,
    /// Permalink posted to the target channel
    Forwarded(ForwardAction),
    /// Forwarding was attempted and failed; already logged
    Failed,
}

/// Response the web layer should produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Echo the handshake challenge verbatim
    Challenge(String),
    /// Acknowledge with "OK"
    Acknowledge(Outcome),
}

pub struct Dispatcher {
    settings: RelaySettings,
    classifier: Arc<dyn Classifier>,
    slack: Option<Arc<dyn SlackApi>>,
}

impl Dispatcher {
    pub fn new(
        settings: RelaySettings,
        classifier: Arc<dyn Classifier>,
        slack: Option<Arc<dyn SlackApi>>,
    ) -> Self {
        Self {
            settings,
            classifier,
            slack,
        }
    }

    /// Build a dispatcher with the Slack client and classifier described by
    /// `config`.
    ///
    /// A missing bot token or an unusable API URL leaves the dispatcher
    /// without a client; forwarding then degrades to a logged no-op.
    pub fn from_config(config: &Config) -> Self {
        let slack: Option<Arc<dyn SlackApi>> = match &config.slack_bot_token {
            Some(token) => match SlackClient::new(
                &config.slack_api_base_url,
                token.clone(),
                config.slack_request_timeout(),
            ) {
                Ok(client) => {
                    info!(base_url = %config.slack_api_base_url, "slack_client_initialized");
                    Some(Arc::new(client))
                }
                Err(e) => {
                    error!(error = %e, "slack_client_init_failed");
                    None
                }
            },
            None => None,
        };

        let classifier: Arc<dyn Classifier> = match &config.forward_keywords {
            Some(keywords) => {
                info!(keyword_count = keywords.len(), "classifier_keywords");
                Arc::new(KeywordClassifier::new(keywords))
            }
            None => {
                info!("classifier_accept_all");
                Arc::new(AcceptAll)
            }
        };

        Self::new(RelaySettings::from(config), classifier, slack)
    }

    /// Route an envelope and run any forwarding it triggers.
    pub async fn handle(&self, envelope: EventEnvelope) -> Action {
        match envelope {
            EventEnvelope::UrlVerification { challenge } => {
                info!(challenge_length = challenge.len(), "slack_url_verification");
                Action::Challenge(challenge)
            }
            EventEnvelope::EventCallback { event } => {
                if !self.is_eligible(&event) {
                    debug!(
                        event_type = %event.event_type,
                        subtype = ?event.subtype,
                        channel = %event.channel_id,
                        "slack_event_ignored"
                    );
                    return Action::Acknowledge(Outcome::Ignored);
                }

                info!(
                    channel = %event.channel_id,
                    user = %event.user_id,
                    ts = %event.timestamp_token,
                    text_length = event.text.len(),
                    "slack_monitored_message_received"
                );

                Action::Acknowledge(self.forward(&event).await)
            }
            EventEnvelope::Other => {
                debug!("slack_envelope_ignored");
                Action::Acknowledge(Outcome::Ignored)
            }
        }
    }

    /// A plain user message posted in the monitored channel.
    pub fn is_eligible(&self, event: &MessageEvent) -> bool {
        match &self.settings.monitor_channel_id {
            Some(monitored) => event.is_plain_message() && event.channel_id == *monitored,
            None => false,
        }
    }

    /// Classify and forward, bounded by the forward timeout. Never fails.
    async fn forward(&self, event: &MessageEvent) -> Outcome {
        let result =
            tokio::time::timeout(self.settings.forward_timeout, self.try_forward(event)).await;

        match result {
            Ok(Ok(None)) => {
                info!(channel = %event.channel_id, ts = %event.timestamp_token, "slack_forward_declined");
                Outcome::Declined
            }
            Ok(Ok(Some(action))) => {
                info!(
                    target_channel = %action.target_channel,
                    permalink = %action.permalink,
                    "slack_forward_complete"
                );
                Outcome::Forwarded(action)
            }
            Ok(Err(RelayError::ConfigurationMissing(what))) => {
                warn!(missing = what, "slack_forward_skipped");
                Outcome::Failed
            }
            Ok(Err(RelayError::OutboundApi(SlackApiError::Api {
                error,
                needed,
                provided,
            }))) => {
                error!(
                    error = %error,
                    needed = ?needed,
                    provided = ?provided,
                    "slack_forward_api_error"
                );
                Outcome::Failed
            }
            Ok(Err(e)) => {
                error!(error = %e, "slack_forward_failed");
                Outcome::Failed
            }
            Err(_) => {
                error!(
                    timeout_ms = self.settings.forward_timeout.as_millis() as u64,
                    "slack_forward_timeout"
                );
                Outcome::Failed
            }
        }
    }

    /// `Ok(None)` when the classifier declines the message.
    async fn try_forward(&self, event: &MessageEvent) -> Result<Option<ForwardAction>, RelayError> {
        if !self.classifier.classify(&event.text).await? {
            return Ok(None);
        }

        let slack = self
            .slack
            .as_ref()
            .ok_or(RelayError::ConfigurationMissing("SLACK_BOT_TOKEN"))?;
        let target_channel = self
            .settings
            .target_channel_id
            .as_deref()
            .ok_or(RelayError::ConfigurationMissing("TARGET_CHANNEL_ID"))?;

        let permalink = slack
            .get_permalink(&event.channel_id, &event.timestamp_token)
            .await?;
        debug!(permalink = %permalink, "slack_permalink_received");

        let message = format!("{}\n{}", self.settings.message_prefix, permalink);
        slack.post_message(target_channel, &message, true).await?;

        Ok(Some(ForwardAction {
            permalink,
            target_channel: target_channel.to_string(),
            message,
        }))
    }
}

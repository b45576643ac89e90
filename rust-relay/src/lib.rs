//! Slack channel relay.
//!
//! Receives Slack Events API webhooks, verifies their signatures, and
//! forwards a permalink to messages from a monitored channel into a target
//! channel.
//!
//! ## Architecture
//!
//! ```text
//! Slack → /slack/events → SignatureVerifier → Dispatcher → Slack Web API
//! ```

pub mod config;
pub mod error;
pub mod relay;
pub mod slack;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use error::RelayError;
pub use relay::{Action, Classifier, Dispatcher, Outcome};
pub use slack::{EventEnvelope, MessageEvent, SlackApi, SlackClient};
pub use web::{router, AppState, SignatureVerifier};

//! Web server module for handling the Slack Events API webhook.
//!
//! This module provides a small web server that:
//! - Verifies Slack request signatures over the raw body
//! - Answers the URL verification handshake
//! - Forwards qualifying monitored-channel messages
//! - Returns 200 OK for every authentic event

pub mod handlers;
pub mod signature;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use handlers::{health, slack_events, AppState, HealthResponse};
pub use signature::{
    compute_slack_signature, is_signature_verification_enabled, unix_now, verify_slack_signature,
    SignatureVerifier,
};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/slack/events", post(slack_events))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

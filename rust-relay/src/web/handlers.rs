//! Webhook endpoint handlers.
//!
//! The events handler:
//! 1. Reads the raw body and verifies the Slack signature over it
//! 2. Decodes the JSON envelope
//! 3. Hands it to the dispatcher
//! 4. Answers with the challenge or "OK"
//!
//! Only inbound problems (bad signature, bad JSON, unreadable body) produce
//! error statuses. Forwarding failures are acknowledged like successes.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::RelayError;
use crate::relay::{Action, Dispatcher};
use crate::slack::{EventEnvelope, RETRY_NUM_HEADER, RETRY_REASON_HEADER};
use crate::web::signature::{unix_now, SignatureVerifier};
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub verifier: Arc<SignatureVerifier>,
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let verifier = SignatureVerifier::from_config(&config);
        let dispatcher = Dispatcher::from_config(&config);
        Self::with_parts(config, verifier, dispatcher)
    }

    pub fn with_parts(config: Config, verifier: SignatureVerifier, dispatcher: Dispatcher) -> Self {
        Self {
            config: Arc::new(config),
            verifier: Arc::new(verifier),
            dispatcher: Arc::new(dispatcher),
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Slack Events
// =============================================================================

/// Slack Events API endpoint.
pub async fn slack_events(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<Response, RelayError> {
    let raw_body = axum::body::to_bytes(body, state.config.max_body_bytes)
        .await
        .map_err(|e| {
            error!(error = %e, "slack_body_read_failed");
            RelayError::ReadError(e)
        })?;

    let retry_num = headers.get(RETRY_NUM_HEADER).and_then(|v| v.to_str().ok());
    let retry_reason = headers.get(RETRY_REASON_HEADER).and_then(|v| v.to_str().ok());
    info!(
        body_length = raw_body.len(),
        retry_num = ?retry_num,
        retry_reason = ?retry_reason,
        "slack_request_received"
    );

    if !state.verifier.verify(&headers, &raw_body, unix_now()) {
        warn!("slack_signature_invalid");
        return Err(RelayError::SignatureInvalid);
    }

    let value: serde_json::Value = serde_json::from_slice(&raw_body).map_err(|e| {
        warn!(error = %e, "slack_body_invalid_json");
        RelayError::MalformedBody(e)
    })?;

    let response = match state.dispatcher.handle(EventEnvelope::from_value(value)).await {
        Action::Challenge(challenge) => plain_text(challenge),
        Action::Acknowledge(outcome) => {
            info!(outcome = ?outcome, "slack_request_acknowledged");
            plain_text("OK".to_string())
        }
    };

    Ok(response)
}

fn plain_text(body: String) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}

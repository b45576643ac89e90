//! Error taxonomy for the relay.
//!
//! Inbound failures map to HTTP rejections. Outbound and configuration
//! failures are logged by the dispatcher and never reach the platform.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::relay::ClassifierError;
use crate::slack::SlackApiError;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("invalid slack signature")]
    SignatureInvalid,

    #[error("request body is not valid json: {0}")]
    MalformedBody(#[from] serde_json::Error),

    #[error("failed to read request body: {0}")]
    ReadError(#[source] axum::Error),

    #[error(transparent)]
    OutboundApi(#[from] SlackApiError),

    #[error(transparent)]
    Classification(#[from] ClassifierError),

    #[error("missing configuration: {0}")]
    ConfigurationMissing(&'static str),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::SignatureInvalid => StatusCode::FORBIDDEN,
            RelayError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            RelayError::ReadError(_)
            | RelayError::OutboundApi(_)
            | RelayError::Classification(_)
            | RelayError::ConfigurationMissing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let body = match &self {
            RelayError::SignatureInvalid => "Invalid Slack signature",
            RelayError::MalformedBody(_) => "Bad Request",
            _ => "Internal Server Error",
        };

        (
            self.status(),
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            body,
        )
            .into_response()
    }
}

//! Slack platform module.
//!
//! This module provides:
//! - Events API envelope types received on the webhook endpoint
//! - A Web API client for the outbound permalink and post calls

pub mod client;
pub mod types;

pub use client::{SlackApi, SlackApiError, SlackClient};
pub use types::{
    EventEnvelope, MessageEvent, RETRY_NUM_HEADER, RETRY_REASON_HEADER, SIGNATURE_HEADER,
    TIMESTAMP_HEADER,
};

//! Relay request and reply types

use super::RelayError;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Inbound chat request as posted by the conversation client
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(flatten)]
    pub metadata: RelayMetadata,
}

/// Opaque fields forwarded to the webhook as-is
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_name: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Value>,
}

impl RelayRequest {
    pub fn new(message: impl Into<String>, webhook_url: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            webhook_url: Some(webhook_url.into()),
            metadata: RelayMetadata::default(),
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: RelayMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Returns `(message, webhook_url)`, treating empty strings as absent
    pub fn required(&self) -> Result<(&str, &str), RelayError> {
        match (self.message.as_deref(), self.webhook_url.as_deref()) {
            (Some(message), Some(url)) if !message.is_empty() && !url.is_empty() => {
                Ok((message, url))
            }
            _ => Err(RelayError::MissingInput),
        }
    }
}

/// Body posted to the webhook
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload<'a> {
    pub message: &'a str,
    #[serde(flatten)]
    pub metadata: &'a RelayMetadata,
    pub timestamp: String,
}

impl<'a> WebhookPayload<'a> {
    pub fn new(message: &'a str, metadata: &'a RelayMetadata) -> Self {
        Self {
            message,
            metadata,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Normalized webhook reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayReply {
    pub response: String,
}

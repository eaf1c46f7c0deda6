//! Relay error types

use thiserror::Error;

/// Message returned when the caller omits `message` or `webhookUrl`
pub const MISSING_INPUT_MESSAGE: &str = "Message and webhook URL are required";

/// Failure of a single relay call
#[derive(Debug, Error)]
pub enum RelayError {
    /// Required input absent; no outbound call was made
    #[error("{}", MISSING_INPUT_MESSAGE)]
    MissingInput,

    /// Webhook answered with a non-success status
    #[error("Webhook responded with status: {status}")]
    UpstreamStatus {
        status: u16,
        /// Body text, kept for diagnostics only
        body: String,
    },

    /// Webhook answered 2xx with a blank body
    #[error("Empty response from webhook")]
    EmptyResponse,

    /// Could not reach the webhook or read its reply
    #[error("{message}")]
    Transport { message: String, timed_out: bool },
}

impl RelayError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            timed_out: false,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            timed_out: true,
        }
    }

    pub fn kind(&self) -> RelayErrorKind {
        match self {
            Self::MissingInput => RelayErrorKind::Precondition,
            Self::UpstreamStatus { .. } => RelayErrorKind::UpstreamStatus,
            Self::EmptyResponse => RelayErrorKind::UpstreamEmpty,
            Self::Transport { .. } => RelayErrorKind::Transport,
        }
    }

    /// HTTP status the relay endpoint answers with for this failure
    pub fn http_status(&self) -> u16 {
        match self.kind() {
            RelayErrorKind::Precondition => 400,
            _ => 500,
        }
    }
}

/// Error classification for logging and status mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayErrorKind {
    /// Missing `message` or `webhookUrl`
    Precondition,
    /// Webhook returned non-2xx
    UpstreamStatus,
    /// Webhook returned a blank body
    UpstreamEmpty,
    /// Network, timeout or unusable URL
    Transport,
}

impl RelayErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Precondition => "precondition",
            Self::UpstreamStatus => "upstream_status",
            Self::UpstreamEmpty => "upstream_empty",
            Self::Transport => "transport",
        }
    }
}

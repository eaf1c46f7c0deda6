//! Webhook relay
//!
//! Forwards a chat message to a caller-supplied webhook and normalizes the
//! reply into a display string. Stateless: every call is independent.

mod error;
mod normalize;
mod types;
mod webhook;

#[cfg(test)]
mod proptests;

#[allow(unused_imports)] // Public API re-exports
pub use error::{RelayError, RelayErrorKind, MISSING_INPUT_MESSAGE};
#[allow(unused_imports)]
pub use normalize::{clean_text, extract_answer, normalize_reply, Answer, ANSWER_FIELDS};
#[allow(unused_imports)]
pub use types::{RelayMetadata, RelayReply, RelayRequest, WebhookPayload};
#[allow(unused_imports)]
pub use webhook::{HttpWebhookRelay, RelayConfig, DEFAULT_TIMEOUT};

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for relaying a chat message to a webhook
#[async_trait]
pub trait WebhookRelay: Send + Sync {
    /// Relay one message and return the normalized reply
    async fn relay(&self, request: &RelayRequest) -> Result<RelayReply, RelayError>;
}

#[async_trait]
impl<T: WebhookRelay + ?Sized> WebhookRelay for Arc<T> {
    async fn relay(&self, request: &RelayRequest) -> Result<RelayReply, RelayError> {
        (**self).relay(request).await
    }
}

/// Logging wrapper for relays
pub struct LoggingRelay {
    inner: Arc<dyn WebhookRelay>,
}

impl LoggingRelay {
    pub fn new(inner: Arc<dyn WebhookRelay>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl WebhookRelay for LoggingRelay {
    async fn relay(&self, request: &RelayRequest) -> Result<RelayReply, RelayError> {
        let start = std::time::Instant::now();
        let result = self.inner.relay(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(reply) => {
                tracing::info!(
                    duration_ms = %duration.as_millis(),
                    response_len = reply.response.len(),
                    "Relay completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    duration_ms = %duration.as_millis(),
                    kind = e.kind().as_str(),
                    error = %e,
                    "Relay failed"
                );
            }
        }

        result
    }
}

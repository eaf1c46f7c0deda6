//! Conversation flow for a subject's chat
//!
//! One user turn: persist the outbound message, relay it to the subject's
//! webhook, persist the tutor's reply. Relay failures never surface raw to
//! the user; a fixed apology is stored in place of the reply.

pub mod traits;

#[cfg(test)]
pub mod testing;

pub use traits::*;

use crate::db::{DbError, Message, MessageKind, Subject};
use crate::relay::{RelayMetadata, RelayRequest, WebhookRelay};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Stored as the tutor's reply when the relay fails
pub const FALLBACK_REPLY: &str =
    "Sorry, I encountered an error. Please check your webhook URL and try again.";

/// Stored when the relay succeeds with nothing to show
pub const EMPTY_REPLY: &str = "No response received";

/// Transient notice returned to the user on relay failure
pub const RELAY_FAILURE_NOTICE: &str = "Failed to get response from AI Teacher";

#[derive(Error, Debug)]
pub enum ConversationError {
    #[error("Message cannot be empty")]
    EmptyMessage,
    #[error(transparent)]
    Store(#[from] DbError),
}

/// Outcome of one chat turn
#[derive(Debug, Clone, Serialize)]
pub struct ChatTurn {
    pub sent: Message,
    pub received: Message,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// Drives chat turns against a store and a relay
pub struct ConversationService {
    store: Arc<dyn ChatStore>,
    relay: Arc<dyn WebhookRelay>,
}

impl ConversationService {
    pub fn new(store: Arc<dyn ChatStore>, relay: Arc<dyn WebhookRelay>) -> Self {
        Self { store, relay }
    }

    /// Send a user message to a subject's tutor and record both sides
    pub async fn send_message(
        &self,
        user_id: &str,
        subject_id: &str,
        text: &str,
    ) -> Result<ChatTurn, ConversationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ConversationError::EmptyMessage);
        }

        let subject = self.store.get_subject(user_id, subject_id).await?;

        let sent = self
            .store
            .add_message(&subject.id, user_id, text, MessageKind::Sent)
            .await?;

        let request = relay_request(&subject, user_id, text);

        let (reply, notice) = match self.relay.relay(&request).await {
            Ok(reply) if reply.response.is_empty() => (EMPTY_REPLY.to_string(), None),
            Ok(reply) => (reply.response, None),
            Err(e) => {
                tracing::error!(
                    subject_id = %subject.id,
                    webhook_url = %subject.webhook_url,
                    kind = e.kind().as_str(),
                    error = ?e,
                    "Relay failed, storing fallback reply"
                );
                (
                    FALLBACK_REPLY.to_string(),
                    Some(RELAY_FAILURE_NOTICE.to_string()),
                )
            }
        };

        let received = self
            .store
            .add_message(&subject.id, user_id, &reply, MessageKind::Received)
            .await?;

        Ok(ChatTurn {
            sent,
            received,
            notice,
        })
    }
}

/// Build the relay request for a subject's stored webhook
pub fn relay_request(subject: &Subject, user_id: &str, text: &str) -> RelayRequest {
    RelayRequest::new(text, subject.webhook_url.as_str()).with_metadata(RelayMetadata {
        subject: Some(Value::String(subject.name.clone())),
        subject_name: Some(Value::String(subject.subject_name.clone())),
        class_name: Some(Value::String(subject.class_name.clone())),
        board: Some(Value::String(subject.board.clone())),
        session_id: Some(Value::String(subject.id.clone())),
        user_id: Some(Value::String(user_id.to_string())),
    })
}

//! Mock implementations for testing
//!
//! These mocks let the conversation flow run without a real webhook.

use super::ChatStore;
use crate::db::{DbError, DbResult, Message, MessageKind, Subject};
use crate::relay::{RelayError, RelayReply, RelayRequest, WebhookRelay};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

// ============================================================================
// Mock Relay
// ============================================================================

/// Relay that returns queued outcomes and records every request
#[allow(dead_code)]
pub struct MockRelay {
    outcomes: Mutex<VecDeque<Result<RelayReply, RelayError>>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<RelayRequest>>,
}

#[allow(dead_code)]
impl MockRelay {
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful reply
    pub fn queue_reply(&self, response: impl Into<String>) {
        self.outcomes.lock().unwrap().push_back(Ok(RelayReply {
            response: response.into(),
        }));
    }

    /// Queue a failure
    pub fn queue_error(&self, error: RelayError) {
        self.outcomes.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<RelayRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockRelay {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebhookRelay for MockRelay {
    async fn relay(&self, request: &RelayRequest) -> Result<RelayReply, RelayError> {
        self.requests.lock().unwrap().push(request.clone());
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RelayError::transport("No mock reply queued")))
    }
}

// ============================================================================
// Failing Store
// ============================================================================

/// Store that serves one subject but refuses to persist messages of a given kind
pub struct RejectingStore {
    subject: Subject,
    reject: MessageKind,
    /// Messages accepted so far
    pub accepted: Mutex<Vec<Message>>,
}

impl RejectingStore {
    pub fn new(subject: Subject, reject: MessageKind) -> Self {
        Self {
            subject,
            reject,
            accepted: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ChatStore for RejectingStore {
    async fn get_subject(&self, user_id: &str, subject_id: &str) -> DbResult<Subject> {
        if self.subject.id == subject_id && self.subject.user_id == user_id {
            Ok(self.subject.clone())
        } else {
            Err(DbError::SubjectNotFound(subject_id.to_string()))
        }
    }

    async fn add_message(
        &self,
        subject_id: &str,
        user_id: &str,
        content: &str,
        kind: MessageKind,
    ) -> DbResult<Message> {
        if kind == self.reject {
            return Err(DbError::Poisoned);
        }
        let message = Message {
            id: format!("msg-{}", self.accepted.lock().unwrap().len() + 1),
            subject_id: subject_id.to_string(),
            user_id: user_id.to_string(),
            content: content.to_string(),
            kind,
            created_at: chrono::Utc::now(),
        };
        self.accepted.lock().unwrap().push(message.clone());
        Ok(message)
    }
}

//! Trait abstractions for conversation I/O
//!
//! These traits enable testing the conversation flow with mock implementations.

use crate::db::{Database, DbResult, Message, MessageKind, Subject};
use async_trait::async_trait;
use std::sync::Arc;

/// Storage for subjects and chat messages
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Load a subject owned by the user
    async fn get_subject(&self, user_id: &str, subject_id: &str) -> DbResult<Subject>;

    /// Append a message to a subject's chat
    async fn add_message(
        &self,
        subject_id: &str,
        user_id: &str,
        content: &str,
        kind: MessageKind,
    ) -> DbResult<Message>;
}

#[async_trait]
impl<T: ChatStore + ?Sized> ChatStore for Arc<T> {
    async fn get_subject(&self, user_id: &str, subject_id: &str) -> DbResult<Subject> {
        (**self).get_subject(user_id, subject_id).await
    }

    async fn add_message(
        &self,
        subject_id: &str,
        user_id: &str,
        content: &str,
        kind: MessageKind,
    ) -> DbResult<Message> {
        (**self).add_message(subject_id, user_id, content, kind).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Adapter to use Database as a `ChatStore`
#[derive(Clone)]
pub struct DatabaseStore {
    db: Database,
}

impl DatabaseStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ChatStore for DatabaseStore {
    async fn get_subject(&self, user_id: &str, subject_id: &str) -> DbResult<Subject> {
        self.db.get_subject(user_id, subject_id)
    }

    async fn add_message(
        &self,
        subject_id: &str,
        user_id: &str,
        content: &str,
        kind: MessageKind,
    ) -> DbResult<Message> {
        self.db.add_message(subject_id, user_id, content, kind)
    }
}

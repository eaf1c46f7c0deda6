//! API request and response types

use crate::db::{Message, Subject};
use crate::markdown::Block;
use serde::{Deserialize, Serialize};

/// Request to point a subject at a new webhook
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWebhookRequest {
    #[serde(default)]
    pub webhook_url: String,
}

/// Request to send a chat message to a subject's tutor
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub text: String,
}

/// Response with a list of subjects
#[derive(Debug, Serialize)]
pub struct SubjectListResponse {
    pub subjects: Vec<Subject>,
}

/// Response with a single subject
#[derive(Debug, Serialize)]
pub struct SubjectResponse {
    pub subject: Subject,
}

/// Message together with its rendered node tree
#[derive(Debug, Serialize)]
pub struct RenderedMessage {
    #[serde(flatten)]
    pub message: Message,
    pub blocks: Vec<Block>,
}

impl From<Message> for RenderedMessage {
    fn from(message: Message) -> Self {
        let blocks = crate::markdown::render(&message.content);
        Self { message, blocks }
    }
}

/// Response with a subject's messages
#[derive(Debug, Serialize)]
pub struct MessageListResponse {
    pub messages: Vec<RenderedMessage>,
}

/// Response for clearing a chat
#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub success: bool,
    pub deleted: usize,
}

/// Response for lifecycle actions
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

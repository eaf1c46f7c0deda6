//! HTTP request handlers

use super::types::{
    ClearResponse, ErrorResponse, MessageListResponse, RenderedMessage, SendMessageRequest,
    SubjectListResponse, SubjectResponse, SuccessResponse, UpdateWebhookRequest,
};
use super::AppState;
use crate::conversation::{ChatTurn, ConversationError};
use crate::db::{DbError, NewSubject};
use crate::relay::{RelayError, RelayReply, RelayRequest};
use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequestParts, Path, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Header carrying the authenticated user, set by the fronting auth layer
pub const USER_ID_HEADER: &str = "x-user-id";

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Stateless webhook relay
        .route("/api/chat", post(relay_chat))
        // Subjects
        .route("/api/subjects", get(list_subjects).post(create_subject))
        .route("/api/subjects/:id", get(get_subject))
        .route("/api/subjects/:id/webhook", post(update_webhook))
        .route("/api/subjects/:id/delete", post(delete_subject))
        // Chat
        .route(
            "/api/subjects/:id/messages",
            get(list_messages).post(send_message),
        )
        .route("/api/subjects/:id/clear", post(clear_messages))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Identity
// ============================================================

/// Owner of the request, as asserted by the auth layer
struct UserId(String);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for UserId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| UserId(v.to_string()))
            .ok_or_else(|| AppError::Unauthorized("Missing user identity".to_string()))
    }
}

// ============================================================
// Relay
// ============================================================

async fn relay_chat(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<RelayReply>, AppError> {
    // Parsed regardless of Content-Type; an unreadable body is a server-side failure
    let request: RelayRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!(error = %e, "Unparseable relay request body");
        AppError::Internal(format!("Invalid request body: {e}"))
    })?;

    // Rejected here so no relay implementation is ever invoked without input
    request.required().map_err(AppError::from)?;

    let reply = state.relay.relay(&request).await?;
    Ok(Json(reply))
}

// ============================================================
// Subjects
// ============================================================

async fn list_subjects(
    State(state): State<AppState>,
    UserId(user_id): UserId,
) -> Result<Json<SubjectListResponse>, AppError> {
    let subjects = state.db.list_subjects(&user_id)?;
    Ok(Json(SubjectListResponse { subjects }))
}

async fn create_subject(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Json(req): Json<NewSubject>,
) -> Result<Json<SubjectResponse>, AppError> {
    let subject = state.db.create_subject(&user_id, &req)?;
    tracing::info!(subject_id = %subject.id, user_id = %user_id, "Subject created");
    Ok(Json(SubjectResponse { subject }))
}

async fn get_subject(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(id): Path<String>,
) -> Result<Json<SubjectResponse>, AppError> {
    let subject = state.db.get_subject(&user_id, &id)?;
    Ok(Json(SubjectResponse { subject }))
}

async fn update_webhook(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(id): Path<String>,
    Json(req): Json<UpdateWebhookRequest>,
) -> Result<Json<SubjectResponse>, AppError> {
    let subject = state.db.update_webhook_url(&user_id, &id, &req.webhook_url)?;
    tracing::info!(subject_id = %id, "Webhook updated");
    Ok(Json(SubjectResponse { subject }))
}

async fn delete_subject(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.db.delete_subject(&user_id, &id)?;
    tracing::info!(subject_id = %id, "Subject deleted");
    Ok(Json(SuccessResponse { success: true }))
}

// ============================================================
// Chat
// ============================================================

async fn list_messages(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(id): Path<String>,
) -> Result<Json<MessageListResponse>, AppError> {
    let subject = state.db.get_subject(&user_id, &id)?;
    let messages = state
        .db
        .get_messages(&subject.id)?
        .into_iter()
        .map(RenderedMessage::from)
        .collect();
    Ok(Json(MessageListResponse { messages }))
}

async fn send_message(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<ChatTurn>, AppError> {
    let turn = state
        .conversations
        .send_message(&user_id, &id, &req.text)
        .await?;
    Ok(Json(turn))
}

async fn clear_messages(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(id): Path<String>,
) -> Result<Json<ClearResponse>, AppError> {
    let subject = state.db.get_subject(&user_id, &id)?;
    let deleted = state.db.clear_messages(&subject.id)?;
    tracing::info!(subject_id = %id, deleted, "Chat cleared");
    Ok(Json(ClearResponse {
        success: true,
        deleted,
    }))
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("tutor-relay ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    Internal(String),
}

impl From<RelayError> for AppError {
    fn from(e: RelayError) -> Self {
        match e.http_status() {
            400 => AppError::BadRequest(e.to_string()),
            _ => AppError::Internal(e.to_string()),
        }
    }
}

impl From<DbError> for AppError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::SubjectNotFound(_) => AppError::NotFound(e.to_string()),
            DbError::Validation(msg) => AppError::BadRequest(msg),
            other => {
                tracing::error!(error = %other, "Database failure");
                AppError::Internal(other.to_string())
            }
        }
    }
}

impl From<ConversationError> for AppError {
    fn from(e: ConversationError) -> Self {
        match e {
            ConversationError::EmptyMessage => AppError::BadRequest(e.to_string()),
            ConversationError::Store(db) => db.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}

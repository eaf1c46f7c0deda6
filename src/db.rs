//! Database module for the tutor relay
//!
//! Provides persistence for subjects and their chat messages.

mod schema;

pub use schema::*;

use chrono::{DateTime, Utc};
use reqwest::Url;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Subject not found: {0}")]
    SubjectNotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("Database lock poisoned")]
    Poisoned,
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    #[allow(dead_code)] // Used in tests
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn conn(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }

    fn run_migrations(&self) -> DbResult<()> {
        let conn = self.conn()?;
        // Deleting a subject cascades to its messages
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ==================== Subject Operations ====================

    /// Create a subject owned by `user_id`
    pub fn create_subject(&self, user_id: &str, new: &NewSubject) -> DbResult<Subject> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(DbError::Validation(
                "Please enter a name for this tutor".to_string(),
            ));
        }
        if new.class_name.trim().is_empty() {
            return Err(DbError::Validation("Please select a class".to_string()));
        }
        if new.subject_name.trim().is_empty() {
            return Err(DbError::Validation("Please select a subject".to_string()));
        }
        let webhook_url = validate_webhook_url(&new.webhook_url)?;

        let board = new
            .board
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .unwrap_or(DEFAULT_BOARD);
        let emoji = new
            .emoji
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or(DEFAULT_EMOJI);

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO subjects (id, user_id, name, class_name, subject_name, board, webhook_url, emoji, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
            params![
                id,
                user_id,
                name,
                new.class_name,
                new.subject_name,
                board,
                webhook_url,
                emoji,
                now.to_rfc3339(),
            ],
        )?;

        Ok(Subject {
            id,
            user_id: user_id.to_string(),
            name: name.to_string(),
            class_name: new.class_name.clone(),
            subject_name: new.subject_name.clone(),
            board: board.to_string(),
            webhook_url,
            emoji: emoji.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a subject by ID, only if owned by `user_id`
    pub fn get_subject(&self, user_id: &str, id: &str) -> DbResult<Subject> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, name, class_name, subject_name, board, webhook_url, emoji, created_at, updated_at
             FROM subjects WHERE id = ?1 AND user_id = ?2",
        )?;

        stmt.query_row(params![id, user_id], parse_subject_row)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => DbError::SubjectNotFound(id.to_string()),
                other => DbError::Sqlite(other),
            })
    }

    /// List a user's subjects, newest first
    pub fn list_subjects(&self, user_id: &str) -> DbResult<Vec<Subject>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, name, class_name, subject_name, board, webhook_url, emoji, created_at, updated_at
             FROM subjects WHERE user_id = ?1
             ORDER BY created_at DESC, rowid DESC",
        )?;

        let rows = stmt.query_map(params![user_id], parse_subject_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Point a subject at a new webhook
    pub fn update_webhook_url(&self, user_id: &str, id: &str, url: &str) -> DbResult<Subject> {
        let webhook_url = validate_webhook_url(url)?;
        {
            let conn = self.conn()?;
            let updated = conn.execute(
                "UPDATE subjects SET webhook_url = ?1, updated_at = ?2 WHERE id = ?3 AND user_id = ?4",
                params![webhook_url, Utc::now().to_rfc3339(), id, user_id],
            )?;

            if updated == 0 {
                return Err(DbError::SubjectNotFound(id.to_string()));
            }
        }
        self.get_subject(user_id, id)
    }

    /// Delete a subject and all its messages
    pub fn delete_subject(&self, user_id: &str, id: &str) -> DbResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        // CASCADE only fires while foreign keys are enforced
        tx.execute(
            "DELETE FROM messages WHERE subject_id = ?1 AND subject_id IN (SELECT id FROM subjects WHERE user_id = ?2)",
            params![id, user_id],
        )?;
        let deleted = tx.execute(
            "DELETE FROM subjects WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;

        if deleted == 0 {
            return Err(DbError::SubjectNotFound(id.to_string()));
        }
        tx.commit()?;
        Ok(())
    }

    // ==================== Message Operations ====================

    /// Append a message to a subject's chat
    pub fn add_message(
        &self,
        subject_id: &str,
        user_id: &str,
        content: &str,
        kind: MessageKind,
    ) -> DbResult<Message> {
        let conn = self.conn()?;
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO messages (id, subject_id, user_id, content, kind, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![id, subject_id, user_id, content, kind.as_str(), now.to_rfc3339()],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                DbError::SubjectNotFound(subject_id.to_string())
            }
            other => DbError::Sqlite(other),
        })?;

        Ok(Message {
            id,
            subject_id: subject_id.to_string(),
            user_id: user_id.to_string(),
            content: content.to_string(),
            kind,
            created_at: now,
        })
    }

    /// Get a subject's messages, oldest first
    pub fn get_messages(&self, subject_id: &str) -> DbResult<Vec<Message>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, subject_id, user_id, content, kind, created_at
             FROM messages WHERE subject_id = ?1
             ORDER BY created_at ASC, rowid ASC",
        )?;

        let rows = stmt.query_map(params![subject_id], parse_message_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Delete every message of a subject, returning how many were removed
    pub fn clear_messages(&self, subject_id: &str) -> DbResult<usize> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM messages WHERE subject_id = ?1",
            params![subject_id],
        )?;
        Ok(deleted)
    }
}

/// Trim and check that a webhook URL is absolute
pub fn validate_webhook_url(url: &str) -> DbResult<String> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(DbError::Validation("Please enter a webhook URL".to_string()));
    }
    Url::parse(trimmed)
        .map(|_| trimmed.to_string())
        .map_err(|_| DbError::Validation("Please enter a valid webhook URL".to_string()))
}

fn parse_subject_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Subject> {
    Ok(Subject {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        class_name: row.get(3)?,
        subject_name: row.get(4)?,
        board: row.get(5)?,
        webhook_url: row.get(6)?,
        emoji: row.get(7)?,
        created_at: parse_datetime(&row.get::<_, String>(8)?),
        updated_at: parse_datetime(&row.get::<_, String>(9)?),
    })
}

fn parse_message_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        id: row.get(0)?,
        subject_id: row.get(1)?,
        user_id: row.get(2)?,
        content: row.get(3)?,
        kind: parse_message_kind(&row.get::<_, String>(4)?),
        created_at: parse_datetime(&row.get::<_, String>(5)?),
    })
}

fn parse_message_kind(s: &str) -> MessageKind {
    match s {
        "sent" => MessageKind::Sent,
        _ => MessageKind::Received,
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}

//! HTTP API for the tutor relay

mod handlers;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use handlers::USER_ID_HEADER;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::conversation::{ConversationService, DatabaseStore};
use crate::db::Database;
use crate::relay::WebhookRelay;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub relay: Arc<dyn WebhookRelay>,
    pub conversations: Arc<ConversationService>,
}

impl AppState {
    pub fn new(db: Database, relay: Arc<dyn WebhookRelay>) -> Self {
        let store = Arc::new(DatabaseStore::new(db.clone()));
        Self {
            conversations: Arc::new(ConversationService::new(store, relay.clone())),
            db,
            relay,
        }
    }
}

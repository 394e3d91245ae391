//! Admin broadcast messages.
//!
//! A global, append-only log of announcements. Clients only ever read the
//! most recent [`BROADCAST_WINDOW`] entries.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::storage::Store;

/// Maximum number of broadcasts returned by a listing.
pub const BROADCAST_WINDOW: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminBroadcast {
    pub id: String,
    pub title: String,
    pub body: String,
    /// Milliseconds since the Unix epoch.
    pub sent_at: i64,
}

impl AdminBroadcast {
    /// Build a broadcast from user input, trimming both fields.
    ///
    /// # Errors
    /// Returns [`ValidationError::Empty`] if the title or body is blank.
    pub fn new(title: &str, body: &str, sent_at: i64) -> Result<Self, ValidationError> {
        let title = title.trim();
        let body = body.trim();
        if title.is_empty() {
            return Err(ValidationError::Empty("title".into()));
        }
        if body.is_empty() {
            return Err(ValidationError::Empty("body".into()));
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            body: body.to_string(),
            sent_at,
        })
    }
}

/// Most recent broadcasts, newest first. A failed read degrades to empty.
pub fn load_recent<S: Store + ?Sized>(store: &S) -> Vec<AdminBroadcast> {
    match store.list_recent_broadcasts(BROADCAST_WINDOW) {
        Ok(mut list) => {
            // Stores already sort, but the window is part of the contract.
            list.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
            list.truncate(BROADCAST_WINDOW);
            list
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to load broadcasts");
            Vec::new()
        }
    }
}

//! Consumption event log.
//!
//! One [`Event`] per logged cigarette. The log keeps events in ascending
//! timestamp order and only ever grows at the tail; the one mutation besides
//! appending is a single-step undo of the tail element.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::storage::Store;

/// A single logged consumption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl Event {
    /// Create an event at `timestamp` with a fresh id.
    ///
    /// Ids start with the timestamp so they sort roughly by creation time
    /// when browsed in the store.
    pub fn new(timestamp: i64) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self {
            id: format!("{timestamp}-{}", &suffix[..8]),
            timestamp,
        }
    }
}

/// In-memory, timestamp-ordered view of a user's events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a log from events in any order.
    pub fn from_events(mut events: Vec<Event>) -> Self {
        events.sort_by_key(|e| e.timestamp);
        Self { events }
    }

    /// Fetch all of a user's events, ascending by timestamp.
    ///
    /// A failed read degrades to an empty log.
    pub fn load_all<S: Store + ?Sized>(store: &S, user_id: &str) -> Self {
        match store.list_events(user_id) {
            Ok(events) => Self::from_events(events),
            Err(e) => {
                tracing::warn!(user_id, error = %e, "failed to load event log, starting empty");
                Self::default()
            }
        }
    }

    /// Create an event at `now`, persist it, then add it to the tail.
    ///
    /// # Errors
    /// Returns the store error if the write fails; the log is left untouched.
    pub fn append<S: Store + ?Sized>(&mut self, store: &S, user_id: &str, now: i64) -> Result<Event> {
        let event = Event::new(now);
        store.insert_event(user_id, &event)?;
        self.events.push(event.clone());
        Ok(event)
    }

    /// Delete the tail event from the store and from memory.
    ///
    /// Returns `Ok(None)` when the log is empty. Only the most recently
    /// appended event (by local ordering) can be removed.
    ///
    /// # Errors
    /// Returns the store error if the delete fails; the log is left untouched.
    pub fn remove_last<S: Store + ?Sized>(
        &mut self,
        store: &S,
        user_id: &str,
    ) -> Result<Option<Event>> {
        let Some(last) = self.events.last() else {
            return Ok(None);
        };
        store.delete_event(user_id, &last.id)?;
        Ok(self.events.pop())
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Timestamp of the first (earliest) event.
    pub fn first_timestamp(&self) -> Option<i64> {
        self.events.first().map(|e| e.timestamp)
    }

    /// Timestamp of the most recent event.
    pub fn last_event_at(&self) -> Option<i64> {
        self.events.last().map(|e| e.timestamp)
    }
}

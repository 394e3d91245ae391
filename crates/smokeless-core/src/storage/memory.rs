//! In-process store.
//!
//! Keeps everything in maps behind a mutex. Used for ephemeral sessions and
//! throughout the test suite, where [`MemoryStore::set_offline`] simulates a
//! backend outage.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::Store;
use crate::achievements::AchievementState;
use crate::broadcast::AdminBroadcast;
use crate::error::{DatabaseError, Result};
use crate::events::Event;
use crate::push::PushRegistration;
use crate::settings::Settings;

#[derive(Debug, Default)]
struct Inner {
    events: HashMap<String, Vec<Event>>,
    settings: HashMap<String, Settings>,
    achievements: HashMap<String, Vec<AchievementState>>,
    broadcasts: Vec<AdminBroadcast>,
    push_tokens: HashMap<String, PushRegistration>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    offline: AtomicBool,
    read_only: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every read and write until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Fail writes only; reads keep working.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    fn read(&self) -> Result<MutexGuard<'_, Inner>> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(DatabaseError::Unavailable("store is offline".into()).into());
        }
        self.inner
            .lock()
            .map_err(|_| DatabaseError::Unavailable("store mutex poisoned".into()).into())
    }

    fn write(&self) -> Result<MutexGuard<'_, Inner>> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(DatabaseError::Unavailable("store is read-only".into()).into());
        }
        self.read()
    }
}

impl Store for MemoryStore {
    fn list_events(&self, user_id: &str) -> Result<Vec<Event>> {
        let mut events = self.read()?.events.get(user_id).cloned().unwrap_or_default();
        events.sort_by_key(|e| e.timestamp);
        Ok(events)
    }

    fn insert_event(&self, user_id: &str, event: &Event) -> Result<()> {
        let mut inner = self.write()?;
        let events = inner.events.entry(user_id.to_string()).or_default();
        events.retain(|e| e.id != event.id);
        events.push(event.clone());
        Ok(())
    }

    fn delete_event(&self, user_id: &str, event_id: &str) -> Result<()> {
        let mut inner = self.write()?;
        if let Some(events) = inner.events.get_mut(user_id) {
            events.retain(|e| e.id != event_id);
        }
        Ok(())
    }

    fn delete_all_events(&self, user_id: &str) -> Result<usize> {
        Ok(self
            .write()?
            .events
            .remove(user_id)
            .map(|e| e.len())
            .unwrap_or(0))
    }

    fn get_settings(&self, user_id: &str) -> Result<Option<Settings>> {
        Ok(self.read()?.settings.get(user_id).cloned())
    }

    fn put_settings(&self, user_id: &str, settings: &Settings) -> Result<()> {
        self.write()?
            .settings
            .insert(user_id.to_string(), settings.clone());
        Ok(())
    }

    fn list_achievements(&self, user_id: &str) -> Result<Vec<AchievementState>> {
        Ok(self
            .read()?
            .achievements
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    fn upsert_achievements(&self, user_id: &str, states: &[AchievementState]) -> Result<()> {
        let mut inner = self.write()?;
        let stored = inner.achievements.entry(user_id.to_string()).or_default();
        for state in states {
            match stored.iter_mut().find(|s| s.id == state.id) {
                Some(existing) => {
                    existing.progress = state.progress;
                    existing.unlocked_at = existing.unlocked_at.or(state.unlocked_at);
                }
                None => stored.push(state.clone()),
            }
        }
        Ok(())
    }

    fn delete_all_achievements(&self, user_id: &str) -> Result<usize> {
        Ok(self
            .write()?
            .achievements
            .remove(user_id)
            .map(|a| a.len())
            .unwrap_or(0))
    }

    fn insert_broadcast(&self, broadcast: &AdminBroadcast) -> Result<()> {
        self.write()?.broadcasts.push(broadcast.clone());
        Ok(())
    }

    fn list_recent_broadcasts(&self, limit: usize) -> Result<Vec<AdminBroadcast>> {
        // Newest insert first, so the stable sort keeps it ahead on ties.
        let mut list: Vec<AdminBroadcast> =
            self.read()?.broadcasts.iter().rev().cloned().collect();
        list.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
        list.truncate(limit);
        Ok(list)
    }

    fn upsert_push_token(&self, registration: &PushRegistration) -> Result<()> {
        self.write()?
            .push_tokens
            .insert(registration.user_id.clone(), registration.clone());
        Ok(())
    }

    fn list_push_tokens(&self) -> Result<Vec<PushRegistration>> {
        let mut tokens: Vec<PushRegistration> =
            self.read()?.push_tokens.values().cloned().collect();
        tokens.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        Ok(tokens)
    }
}

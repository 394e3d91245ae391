mod config;
pub mod database;
mod memory;
pub mod migrations;

pub use config::{
    AdminConfig, AnalyticsConfig, Config, CurrencyConfig, LogConfig, PushConfig, ADMIN_USER_ID_ENV,
};
pub use database::SqliteStore;
pub use memory::MemoryStore;

use std::path::PathBuf;

use crate::achievements::AchievementState;
use crate::broadcast::AdminBroadcast;
use crate::error::{ConfigError, Result};
use crate::events::Event;
use crate::push::PushRegistration;
use crate::settings::Settings;

/// Persistence contract for per-user data plus the global broadcast log.
///
/// Every per-user call is keyed by the opaque user id. Implementations report
/// failures through [`CoreError`](crate::CoreError); callers decide whether a
/// failure degrades (reads) or propagates (writes).
pub trait Store {
    /// All events for `user_id`, ascending by timestamp.
    fn list_events(&self, user_id: &str) -> Result<Vec<Event>>;
    fn insert_event(&self, user_id: &str, event: &Event) -> Result<()>;
    /// Delete one event by id. Deleting a missing id is not an error.
    fn delete_event(&self, user_id: &str, event_id: &str) -> Result<()>;
    /// Returns the number of deleted events.
    fn delete_all_events(&self, user_id: &str) -> Result<usize>;

    fn get_settings(&self, user_id: &str) -> Result<Option<Settings>>;
    fn put_settings(&self, user_id: &str, settings: &Settings) -> Result<()>;

    fn list_achievements(&self, user_id: &str) -> Result<Vec<AchievementState>>;
    /// Write all states as one batch. An already stored unlock time is kept
    /// even if the incoming state lacks one.
    fn upsert_achievements(&self, user_id: &str, states: &[AchievementState]) -> Result<()>;
    fn delete_all_achievements(&self, user_id: &str) -> Result<usize>;

    fn insert_broadcast(&self, broadcast: &AdminBroadcast) -> Result<()>;
    /// Newest first, at most `limit` entries.
    fn list_recent_broadcasts(&self, limit: usize) -> Result<Vec<AdminBroadcast>>;

    fn upsert_push_token(&self, registration: &PushRegistration) -> Result<()>;
    fn list_push_tokens(&self) -> Result<Vec<PushRegistration>>;
}

impl<S: Store + ?Sized> Store for &S {
    fn list_events(&self, user_id: &str) -> Result<Vec<Event>> {
        (**self).list_events(user_id)
    }
    fn insert_event(&self, user_id: &str, event: &Event) -> Result<()> {
        (**self).insert_event(user_id, event)
    }
    fn delete_event(&self, user_id: &str, event_id: &str) -> Result<()> {
        (**self).delete_event(user_id, event_id)
    }
    fn delete_all_events(&self, user_id: &str) -> Result<usize> {
        (**self).delete_all_events(user_id)
    }
    fn get_settings(&self, user_id: &str) -> Result<Option<Settings>> {
        (**self).get_settings(user_id)
    }
    fn put_settings(&self, user_id: &str, settings: &Settings) -> Result<()> {
        (**self).put_settings(user_id, settings)
    }
    fn list_achievements(&self, user_id: &str) -> Result<Vec<AchievementState>> {
        (**self).list_achievements(user_id)
    }
    fn upsert_achievements(&self, user_id: &str, states: &[AchievementState]) -> Result<()> {
        (**self).upsert_achievements(user_id, states)
    }
    fn delete_all_achievements(&self, user_id: &str) -> Result<usize> {
        (**self).delete_all_achievements(user_id)
    }
    fn insert_broadcast(&self, broadcast: &AdminBroadcast) -> Result<()> {
        (**self).insert_broadcast(broadcast)
    }
    fn list_recent_broadcasts(&self, limit: usize) -> Result<Vec<AdminBroadcast>> {
        (**self).list_recent_broadcasts(limit)
    }
    fn upsert_push_token(&self, registration: &PushRegistration) -> Result<()> {
        (**self).upsert_push_token(registration)
    }
    fn list_push_tokens(&self) -> Result<Vec<PushRegistration>> {
        (**self).list_push_tokens()
    }
}

/// Returns `~/.config/smokeless[-dev]/` based on SMOKELESS_ENV.
///
/// Set SMOKELESS_ENV=dev to use the development data directory, or
/// SMOKELESS_DATA_DIR to point somewhere else entirely.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("SMOKELESS_DATA_DIR") {
        Some(custom) if !custom.is_empty() => PathBuf::from(custom),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("SMOKELESS_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("smokeless-dev")
            } else {
                base_dir.join("smokeless")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

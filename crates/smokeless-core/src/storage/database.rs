//! SQLite-backed store.
//!
//! Provides persistent storage for:
//! - Per-user event logs, settings and achievement states
//! - The global admin broadcast log
//! - Push registrations

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

use super::{data_dir, migrations, Store};
use crate::achievements::{self, AchievementState};
use crate::broadcast::AdminBroadcast;
use crate::error::{DatabaseError, Result};
use crate::events::Event;
use crate::push::PushRegistration;
use crate::settings::{
    Settings, DEFAULT_CIGARETTES_PER_PACK, DEFAULT_DAILY_LIMIT, DEFAULT_PACK_PRICE,
};

/// SQLite database for all smokeless data.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data_dir>/smokeless.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("smokeless.db");
        Self::open_at(&path)
    }

    /// Open (or create) the database at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        migrations::migrate(&conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Run `f` inside an immediate transaction, rolling back on error.
    fn in_transaction<T>(
        &self,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> rusqlite::Result<T> {
        self.conn.execute_batch("BEGIN IMMEDIATE TRANSACTION;")?;
        match f(&self.conn) {
            Ok(value) => {
                self.conn.execute_batch("COMMIT;")?;
                Ok(value)
            }
            Err(err) => {
                let _ = self.conn.execute_batch("ROLLBACK;");
                Err(err)
            }
        }
    }
}

impl Store for SqliteStore {
    fn list_events(&self, user_id: &str) -> Result<Vec<Event>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, timestamp FROM events
             WHERE user_id = ?1
             ORDER BY timestamp ASC, rowid ASC",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok(Event {
                id: row.get(0)?,
                timestamp: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn insert_event(&self, user_id: &str, event: &Event) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO events (user_id, id, timestamp) VALUES (?1, ?2, ?3)",
            params![user_id, event.id, event.timestamp],
        )?;
        Ok(())
    }

    fn delete_event(&self, user_id: &str, event_id: &str) -> Result<()> {
        self.conn.execute(
            "DELETE FROM events WHERE user_id = ?1 AND id = ?2",
            params![user_id, event_id],
        )?;
        Ok(())
    }

    fn delete_all_events(&self, user_id: &str) -> Result<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM events WHERE user_id = ?1", params![user_id])?)
    }

    fn get_settings(&self, user_id: &str) -> Result<Option<Settings>> {
        let row = self
            .conn
            .query_row(
                "SELECT daily_limit, pack_price, cigarettes_per_pack, user_name, created_at
                 FROM user_settings WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok((
                        row.get::<_, Option<i64>>(0)?,
                        row.get::<_, Option<f64>>(1)?,
                        row.get::<_, Option<i64>>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, Option<i64>>(4)?,
                    ))
                },
            )
            .optional()?;

        // Columns left NULL by older writers fall back to defaults.
        Ok(row.map(|(limit, price, per_pack, name, created_at)| Settings {
            daily_limit: limit.unwrap_or(DEFAULT_DAILY_LIMIT),
            pack_price: price.unwrap_or(DEFAULT_PACK_PRICE),
            cigarettes_per_pack: per_pack.unwrap_or(DEFAULT_CIGARETTES_PER_PACK),
            user_name: name.unwrap_or_default(),
            created_at: created_at.unwrap_or(0),
        }))
    }

    fn put_settings(&self, user_id: &str, settings: &Settings) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO user_settings
                (user_id, daily_limit, pack_price, cigarettes_per_pack, user_name, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user_id,
                settings.daily_limit,
                settings.pack_price,
                settings.cigarettes_per_pack,
                settings.user_name,
                settings.created_at,
            ],
        )?;
        Ok(())
    }

    fn list_achievements(&self, user_id: &str) -> Result<Vec<AchievementState>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, unlocked_at, progress FROM achievements WHERE user_id = ?1 ORDER BY rowid",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok(AchievementState {
                id: row.get(0)?,
                unlocked_at: row.get(1)?,
                progress: row.get::<_, i64>(2)?.max(0) as u64,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn upsert_achievements(&self, user_id: &str, states: &[AchievementState]) -> Result<()> {
        self.in_transaction(|conn| {
            let mut stmt = conn.prepare(
                "INSERT INTO achievements
                    (user_id, id, category, title, description, icon, target, unlocked_at, progress)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(user_id, id) DO UPDATE SET
                    category    = excluded.category,
                    title       = excluded.title,
                    description = excluded.description,
                    icon        = excluded.icon,
                    target      = excluded.target,
                    progress    = excluded.progress,
                    unlocked_at = COALESCE(achievements.unlocked_at, excluded.unlocked_at)",
            )?;
            for state in states {
                let def = achievements::find(&state.id);
                stmt.execute(params![
                    user_id,
                    state.id,
                    def.map(|d| d.category.as_str()).unwrap_or(""),
                    def.map(|d| d.title).unwrap_or(""),
                    def.map(|d| d.description).unwrap_or(""),
                    def.map(|d| d.icon).unwrap_or(""),
                    def.map(|d| d.target as i64).unwrap_or(0),
                    state.unlocked_at,
                    i64::try_from(state.progress).unwrap_or(i64::MAX),
                ])?;
            }
            Ok(())
        })?;
        Ok(())
    }

    fn delete_all_achievements(&self, user_id: &str) -> Result<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM achievements WHERE user_id = ?1", params![user_id])?)
    }

    fn insert_broadcast(&self, broadcast: &AdminBroadcast) -> Result<()> {
        self.conn.execute(
            "INSERT INTO admin_broadcasts (id, title, body, sent_at) VALUES (?1, ?2, ?3, ?4)",
            params![broadcast.id, broadcast.title, broadcast.body, broadcast.sent_at],
        )?;
        Ok(())
    }

    fn list_recent_broadcasts(&self, limit: usize) -> Result<Vec<AdminBroadcast>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, body, sent_at FROM admin_broadcasts
             ORDER BY sent_at DESC, rowid DESC
             LIMIT ?1",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![limit], |row| {
            Ok(AdminBroadcast {
                id: row.get(0)?,
                title: row.get(1)?,
                body: row.get(2)?,
                sent_at: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn upsert_push_token(&self, registration: &PushRegistration) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO push_tokens (user_id, token, platform, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                registration.user_id,
                registration.token,
                registration.platform,
                registration.updated_at,
            ],
        )?;
        Ok(())
    }

    fn list_push_tokens(&self) -> Result<Vec<PushRegistration>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, token, platform, updated_at FROM push_tokens
             WHERE token <> ''
             ORDER BY user_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(PushRegistration {
                user_id: row.get(0)?,
                token: row.get(1)?,
                platform: row.get(2)?,
                updated_at: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::achievements::{seed_states, CATALOG};

    #[test]
    fn events_round_trip_in_timestamp_order() {
        let db = SqliteStore::open_memory().unwrap();
        let late = Event::new(2_000);
        let early = Event::new(1_000);
        db.insert_event("u", &late).unwrap();
        db.insert_event("u", &early).unwrap();

        assert_eq!(db.list_events("u").unwrap(), vec![early.clone(), late]);

        db.delete_event("u", &early.id).unwrap();
        assert_eq!(db.list_events("u").unwrap().len(), 1);
        assert_eq!(db.delete_all_events("u").unwrap(), 1);
        assert!(db.list_events("u").unwrap().is_empty());
    }

    #[test]
    fn settings_null_columns_fall_back_to_defaults() {
        let db = SqliteStore::open_memory().unwrap();
        assert!(db.get_settings("u").unwrap().is_none());

        db.conn()
            .execute(
                "INSERT INTO user_settings (user_id, daily_limit) VALUES ('u', 7)",
                [],
            )
            .unwrap();
        let settings = db.get_settings("u").unwrap().unwrap();
        assert_eq!(settings.daily_limit, 7);
        assert_eq!(settings.pack_price, DEFAULT_PACK_PRICE);
        assert_eq!(settings.cigarettes_per_pack, DEFAULT_CIGARETTES_PER_PACK);
    }

    #[test]
    fn settings_put_replaces() {
        let db = SqliteStore::open_memory().unwrap();
        let mut settings = Settings::defaults(5);
        db.put_settings("u", &settings).unwrap();
        settings.user_name = "Ada".into();
        db.put_settings("u", &settings).unwrap();
        assert_eq!(db.get_settings("u").unwrap(), Some(settings));
    }

    #[test]
    fn achievements_keep_unlock_time() {
        let db = SqliteStore::open_memory().unwrap();
        let mut states = seed_states(&CATALOG);
        db.upsert_achievements("u", &states).unwrap();

        states[0].unlocked_at = Some(42);
        states[0].progress = 1;
        db.upsert_achievements("u", &states).unwrap();

        states[0].unlocked_at = None;
        states[0].progress = 0;
        db.upsert_achievements("u", &states).unwrap();

        let stored = db.list_achievements("u").unwrap();
        assert_eq!(stored.len(), CATALOG.len());
        assert_eq!(stored[0].id, "first_day");
        assert_eq!(stored[0].unlocked_at, Some(42));

        let category: String = db
            .conn()
            .query_row(
                "SELECT category FROM achievements WHERE user_id = 'u' AND id = 'crisis_1'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(category, "crisis");
    }

    #[test]
    fn same_time_broadcasts_list_latest_insert_first() {
        let db = SqliteStore::open_memory().unwrap();
        for title in ["first", "second", "third"] {
            db.insert_broadcast(&AdminBroadcast::new(title, "b", 1_000).unwrap())
                .unwrap();
        }
        let titles: Vec<String> = db
            .list_recent_broadcasts(20)
            .unwrap()
            .into_iter()
            .map(|b| b.title)
            .collect();
        assert_eq!(titles, ["third", "second", "first"]);
    }

    #[test]
    fn broadcasts_newest_first_with_limit() {
        let db = SqliteStore::open_memory().unwrap();
        for i in 0..25 {
            db.insert_broadcast(&AdminBroadcast::new("t", "b", i).unwrap())
                .unwrap();
        }
        let list = db.list_recent_broadcasts(20).unwrap();
        assert_eq!(list.len(), 20);
        assert_eq!(list[0].sent_at, 24);
        assert!(list.windows(2).all(|w| w[0].sent_at > w[1].sent_at));
    }

    #[test]
    fn push_tokens_upsert_per_user() {
        let db = SqliteStore::open_memory().unwrap();
        let mut reg = PushRegistration {
            user_id: "u".into(),
            token: "ExponentPushToken[a]".into(),
            platform: "ios".into(),
            updated_at: 1,
        };
        db.upsert_push_token(&reg).unwrap();
        reg.token = "ExponentPushToken[b]".into();
        db.upsert_push_token(&reg).unwrap();

        let tokens = db.list_push_tokens().unwrap();
        assert_eq!(tokens, vec![reg]);
    }

    #[test]
    fn open_at_creates_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("smokeless.db");
        {
            let db = SqliteStore::open_at(&path).unwrap();
            db.insert_event("u", &Event::new(1)).unwrap();
        }
        let db = SqliteStore::open_at(&path).unwrap();
        assert_eq!(db.list_events("u").unwrap().len(), 1);
    }
}

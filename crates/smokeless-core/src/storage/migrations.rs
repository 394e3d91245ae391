//! Database schema migrations for smokeless.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (initial database).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            tracing::warn!(error = %e, "failed to read schema_version");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: per-user event log, settings and achievements, plus the
/// global broadcast log.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS events (
            user_id   TEXT NOT NULL,
            id        TEXT NOT NULL,
            timestamp INTEGER NOT NULL,
            PRIMARY KEY (user_id, id)
        );

        CREATE TABLE IF NOT EXISTS user_settings (
            user_id             TEXT PRIMARY KEY,
            daily_limit         INTEGER,
            pack_price          REAL,
            cigarettes_per_pack INTEGER,
            user_name           TEXT,
            created_at          INTEGER
        );

        CREATE TABLE IF NOT EXISTS achievements (
            user_id     TEXT NOT NULL,
            id          TEXT NOT NULL,
            category    TEXT NOT NULL,
            title       TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            icon        TEXT NOT NULL DEFAULT '',
            target      INTEGER NOT NULL DEFAULT 0,
            unlocked_at INTEGER,
            progress    INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (user_id, id)
        );

        CREATE TABLE IF NOT EXISTS admin_broadcasts (
            id      TEXT PRIMARY KEY,
            title   TEXT NOT NULL,
            body    TEXT NOT NULL,
            sent_at INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_events_user_timestamp ON events(user_id, timestamp);
        CREATE INDEX IF NOT EXISTS idx_broadcasts_sent_at ON admin_broadcasts(sent_at);",
    )?;
    set_schema_version(conn, 1)?;
    Ok(())
}

/// Migration v2: push registrations.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS push_tokens (
            user_id    TEXT PRIMARY KEY,
            token      TEXT NOT NULL,
            platform   TEXT NOT NULL DEFAULT '',
            updated_at INTEGER NOT NULL
        );",
    )?;
    set_schema_version(conn, 2)?;
    Ok(())
}

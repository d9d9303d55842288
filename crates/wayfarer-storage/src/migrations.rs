//! Database schema migrations.
//!
//! Applies the initial schema: contacts, locations and schema_migrations.

use rusqlite::Connection;
use tracing::info;

use wayfarer_core::error::WayfarerError;

/// Run all pending database migrations.
pub fn run_migrations(conn: &Connection) -> Result<(), WayfarerError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| WayfarerError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| WayfarerError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: initial_schema");
    }

    Ok(())
}

/// Version 1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<(), WayfarerError> {
    conn.execute_batch(
        "
        -- Emergency contacts, one row per (user, canonical number).
        CREATE TABLE IF NOT EXISTS contacts (
            id              TEXT PRIMARY KEY NOT NULL,
            user_id         TEXT NOT NULL,
            name            TEXT NOT NULL,
            number          TEXT NOT NULL,
            relation        TEXT NOT NULL DEFAULT 'family',
            created_at      INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
            UNIQUE (user_id, number)
        );

        CREATE INDEX IF NOT EXISTS idx_contacts_user
            ON contacts (user_id, created_at ASC);

        -- Last known location per user.
        CREATE TABLE IF NOT EXISTS locations (
            user_id         TEXT PRIMARY KEY NOT NULL,
            lat             REAL NOT NULL CHECK (lat BETWEEN -90.0 AND 90.0),
            lon             REAL NOT NULL CHECK (lon BETWEEN -180.0 AND 180.0),
            city_hint       TEXT,
            updated_at      INTEGER NOT NULL
        );

        INSERT OR IGNORE INTO schema_migrations (version, name) VALUES (1, 'initial_schema');
        ",
    )
    .map_err(|e| WayfarerError::Storage(format!("Failed to apply migration v1: {}", e)))?;

    Ok(())
}

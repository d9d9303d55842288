//! Repository implementations for SQLite-backed persistence.
//!
//! Provides ContactRepository and LocationRepository operating on the
//! Database struct using raw SQL.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::OptionalExtension;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use wayfarer_core::error::WayfarerError;
use wayfarer_core::types::{Contact, SavedLocation};

use crate::db::Database;

/// Repository for per-user emergency contacts.
#[derive(Debug, Clone)]
pub struct ContactRepository {
    db: Arc<Database>,
}

impl ContactRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Store a contact for a user. Re-adding the same number updates the
    /// name and relation instead of creating a duplicate.
    pub fn add(&self, user_id: &str, contact: &Contact) -> Result<(), WayfarerError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO contacts (id, user_id, name, number, relation)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (user_id, number)
                 DO UPDATE SET name = excluded.name, relation = excluded.relation",
                rusqlite::params![
                    Uuid::new_v4().to_string(),
                    user_id,
                    contact.name,
                    contact.phone_number,
                    contact.relation,
                ],
            )
            .map_err(|e| WayfarerError::Storage(format!("Failed to save contact: {}", e)))?;
            Ok(())
        })
    }

    /// All contacts of a user, oldest first.
    pub fn list(&self, user_id: &str) -> Result<Vec<Contact>, WayfarerError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT name, number, relation FROM contacts
                     WHERE user_id = ?1
                     ORDER BY created_at ASC, rowid ASC",
                )
                .map_err(|e| WayfarerError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(rusqlite::params![user_id], |row| {
                    Ok(Contact {
                        name: row.get(0)?,
                        phone_number: row.get(1)?,
                        relation: row.get(2)?,
                    })
                })
                .map_err(|e| WayfarerError::Storage(e.to_string()))?;

            let mut contacts = Vec::new();
            for row in rows {
                contacts.push(row.map_err(|e| WayfarerError::Storage(e.to_string()))?);
            }
            Ok(contacts)
        })
    }

    /// Remove every contact of a user. Returns the number removed.
    pub fn clear(&self, user_id: &str) -> Result<usize, WayfarerError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "DELETE FROM contacts WHERE user_id = ?1",
                rusqlite::params![user_id],
            )
            .map_err(|e| WayfarerError::Storage(format!("Failed to clear contacts: {}", e)))
        })
    }
}

/// A saved location together with the time it was reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredLocation {
    #[serde(flatten)]
    pub location: SavedLocation,
    pub updated_at: DateTime<Utc>,
}

/// Repository for the last known location of each user.
#[derive(Debug, Clone)]
pub struct LocationRepository {
    db: Arc<Database>,
}

impl LocationRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert or replace the user's location.
    pub fn save(&self, user_id: &str, location: &SavedLocation) -> Result<(), WayfarerError> {
        if !location.in_range() {
            return Err(WayfarerError::Storage(format!(
                "Coordinates out of range: {}, {}",
                location.lat, location.lon
            )));
        }

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO locations (user_id, lat, lon, city_hint, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (user_id) DO UPDATE SET
                    lat = excluded.lat,
                    lon = excluded.lon,
                    city_hint = excluded.city_hint,
                    updated_at = excluded.updated_at",
                rusqlite::params![
                    user_id,
                    location.lat,
                    location.lon,
                    location.city_hint,
                    Utc::now().timestamp(),
                ],
            )
            .map_err(|e| WayfarerError::Storage(format!("Failed to save location: {}", e)))?;
            Ok(())
        })
    }

    /// The user's last saved location, if any.
    pub fn load(&self, user_id: &str) -> Result<Option<StoredLocation>, WayfarerError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT lat, lon, city_hint, updated_at FROM locations WHERE user_id = ?1",
                rusqlite::params![user_id],
                |row| {
                    let updated: i64 = row.get(3)?;
                    Ok(StoredLocation {
                        location: SavedLocation {
                            lat: row.get(0)?,
                            lon: row.get(1)?,
                            city_hint: row.get(2)?,
                        },
                        updated_at: Utc
                            .timestamp_opt(updated, 0)
                            .single()
                            .unwrap_or_else(Utc::now),
                    })
                },
            )
            .optional()
            .map_err(|e| WayfarerError::Storage(e.to_string()))
        })
    }
}

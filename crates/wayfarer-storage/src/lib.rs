//! Wayfarer Storage crate - SQLite persistence for contacts and locations.
//!
//! Provides a WAL-mode SQLite database with migrations and the repositories
//! backing the primary contact and location collaborators.

pub mod db;
pub mod migrations;
pub mod repository;

pub use db::Database;
pub use repository::{ContactRepository, LocationRepository, StoredLocation};

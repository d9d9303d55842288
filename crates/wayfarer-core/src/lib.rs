//! Core types, configuration, error handling and location correction for
//! the Wayfarer travel assistant.

pub mod config;
pub mod error;
pub mod location;
pub mod types;

pub use config::WayfarerConfig;
pub use error::{Result, WayfarerError};
pub use location::{Gazetteer, LocationNormalizer, LocationResolution};
pub use types::{AlertMessage, ApiStatus, Contact, DeliveryResult, DeliveryStatus, SavedLocation};

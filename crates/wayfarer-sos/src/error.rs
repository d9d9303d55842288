use thiserror::Error;

use wayfarer_core::error::WayfarerError;

/// Errors raised by contact stores and alert channels.
///
/// None of these leave the [`crate::SosService`]: they are folded into
/// delivery results or user-facing replies.
#[derive(Debug, Error)]
pub enum SosError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("Invalid contact: {0}")]
    InvalidContact(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<WayfarerError> for SosError {
    fn from(err: WayfarerError) -> Self {
        SosError::Storage(err.to_string())
    }
}

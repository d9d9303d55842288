use thiserror::Error;

/// Top-level error type for the Wayfarer system.
///
/// Subsystem crates define their own error types and implement
/// `From<WayfarerError>` where they need `?` across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WayfarerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Shutdown in progress")]
    ShuttingDown,
}

impl From<toml::de::Error> for WayfarerError {
    fn from(err: toml::de::Error) -> Self {
        WayfarerError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for WayfarerError {
    fn from(err: toml::ser::Error) -> Self {
        WayfarerError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for WayfarerError {
    fn from(err: serde_json::Error) -> Self {
        WayfarerError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Wayfarer operations.
pub type Result<T> = std::result::Result<T, WayfarerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WayfarerError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");
    }

    #[test]
    fn test_error_display_all_variants() {
        let cases: Vec<(WayfarerError, &str)> = vec![
            (
                WayfarerError::Config("bad key".to_string()),
                "Configuration error: bad key",
            ),
            (
                WayfarerError::Storage("disk full".to_string()),
                "Storage error: disk full",
            ),
            (
                WayfarerError::Api("bind failed".to_string()),
                "API error: bind failed",
            ),
            (
                WayfarerError::Serialization("invalid json".to_string()),
                "Serialization error: invalid json",
            ),
            (WayfarerError::ShuttingDown, "Shutdown in progress"),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: WayfarerError = io_err.into();
        assert!(matches!(err, WayfarerError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let err: std::result::Result<toml::Value, _> = toml::from_str("invalid = [[[");
        let err: WayfarerError = err.unwrap_err().into();
        assert!(matches!(err, WayfarerError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let err: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ nope }");
        let err: WayfarerError = err.unwrap_err().into();
        assert!(matches!(err, WayfarerError::Serialization(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let _value = io_result?;
            Ok("success".to_string())
        }

        assert_eq!(inner().unwrap(), "success");
    }
}

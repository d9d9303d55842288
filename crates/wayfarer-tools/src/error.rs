//! Error types for capability tools.
//!
//! Every variant's `Display` is phrased as guidance for the traveller; raw
//! transport details are logged where the error is created, never shown.

/// Name of an external service as presented to the user.
pub type Service = &'static str;

pub const WEATHER_SERVICE: Service = "Weather service";
pub const PLACES_SERVICE: Service = "Places service";
pub const ROUTE_SERVICE: Service = "Route service";
pub const BOOKING_SERVICE: Service = "Booking service";
pub const IMAGE_SERVICE: Service = "Image service";
pub const NEWS_SERVICE: Service = "News service";
pub const LOCATION_SERVICE: Service = "Location service";
pub const SOS_SERVICE: Service = "Emergency alert service";

/// Failure of one tool invocation.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Required credential absent. Permanent for the life of the process.
    #[error("{0} unavailable - API key not configured")]
    NotConfigured(Service),

    #[error("{0} timed out. Please try again in a moment.")]
    Timeout(Service),

    #[error("{0} authentication failed")]
    Unauthorized(Service),

    #[error("{0} rate limit exceeded. Please try again later.")]
    RateLimited(Service),

    #[error("{service} error (status {code}). Please try again later.")]
    Status { service: Service, code: u16 },

    #[error("{0} is unreachable right now. Please try again in a moment.")]
    Transport(Service),

    #[error("{0} returned unreadable data. Please try again later.")]
    Malformed(Service),

    /// The query was understood but there is no data for it.
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidArguments(String),

    #[error("Unknown tool '{0}' was requested and skipped.")]
    UnknownTool(String),

    /// A failure that still carries a useful alternative for the user.
    #[error("{fallback}")]
    Fallback {
        cause: Box<ToolError>,
        fallback: String,
    },

    /// A downstream subsystem reported failure with its own user-facing text.
    #[error("{0}")]
    Reported(String),
}

impl ToolError {
    /// Whether retrying later could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ToolError::Timeout(_)
            | ToolError::RateLimited(_)
            | ToolError::Status { .. }
            | ToolError::Transport(_)
            | ToolError::Malformed(_) => true,
            ToolError::Fallback { cause, .. } => cause.is_transient(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            ToolError::NotConfigured(WEATHER_SERVICE).to_string(),
            "Weather service unavailable - API key not configured"
        );
        assert_eq!(
            ToolError::Status {
                service: NEWS_SERVICE,
                code: 502
            }
            .to_string(),
            "News service error (status 502). Please try again later."
        );
        assert_eq!(
            ToolError::UnknownTool("FlightTool".to_string()).to_string(),
            "Unknown tool 'FlightTool' was requested and skipped."
        );
    }

    #[test]
    fn test_fallback_displays_alternative() {
        let err = ToolError::Fallback {
            cause: Box::new(ToolError::NotConfigured(BOOKING_SERVICE)),
            fallback: "Search on Booking.com".to_string(),
        };
        assert_eq!(err.to_string(), "Search on Booking.com");
        assert!(!err.is_transient());
    }

    #[test]
    fn test_transient_classification() {
        assert!(ToolError::Timeout(IMAGE_SERVICE).is_transient());
        assert!(ToolError::Transport(ROUTE_SERVICE).is_transient());
        assert!(!ToolError::NotFound("none".to_string()).is_transient());
        assert!(!ToolError::Unauthorized(PLACES_SERVICE).is_transient());
        assert!(!ToolError::NotConfigured(LOCATION_SERVICE).is_transient());
    }
}

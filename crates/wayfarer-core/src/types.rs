//! Shared domain types: emergency contacts, alert messages, delivery
//! results, saved locations and the status vocabulary of the HTTP surface.

use std::fmt;

use chrono::Local;
use serde::{Deserialize, Serialize};

/// Body used when an alert is triggered without a user-supplied message.
pub const DEFAULT_ALERT_BODY: &str =
    "🚨 EMERGENCY! I need immediate help. This is an automated SOS alert.";

/// Timestamp layout embedded in alert messages.
pub const ALERT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// =============================================================================
// Contacts
// =============================================================================

/// An emergency contact. The phone number is always stored in canonical
/// international form; see [`normalize_phone_number`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    #[serde(rename = "number")]
    pub phone_number: String,
    pub relation: String,
}

impl Contact {
    /// Build a contact, normalizing the phone number once.
    pub fn new(
        name: impl Into<String>,
        phone_number: impl AsRef<str>,
        relation: impl Into<String>,
    ) -> Self {
        let relation = relation.into();
        Self {
            name: name.into().trim().to_string(),
            phone_number: normalize_phone_number(phone_number.as_ref()),
            relation: if relation.trim().is_empty() {
                "family".to_string()
            } else {
                relation.trim().to_string()
            },
        }
    }

    /// Number of digits in the canonical phone number.
    pub fn digit_count(&self) -> usize {
        self.phone_number.chars().filter(|c| c.is_ascii_digit()).count()
    }
}

/// Normalize a phone number to `+<country><number>`, defaulting to India (+91).
///
/// Idempotent: normalizing an already-normalized number returns it unchanged.
pub fn normalize_phone_number(raw: &str) -> String {
    let clean: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();

    if clean.starts_with("+91") {
        return clean;
    }
    if clean.starts_with("91") && clean.len() > 10 {
        return format!("+{}", clean);
    }
    if clean.len() == 10 {
        return format!("+91{}", clean);
    }
    if clean.starts_with('+') {
        clean
    } else {
        format!("+91{}", clean)
    }
}

// =============================================================================
// Alerts
// =============================================================================

/// One emergency alert, shared by every per-contact message of a trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertMessage {
    pub body: String,
    pub location: Option<String>,
    pub timestamp: String,
}

impl AlertMessage {
    /// Compose an alert stamped with the current local time.
    pub fn new(body: Option<String>, location: Option<String>) -> Self {
        let timestamp = Local::now().format(ALERT_TIMESTAMP_FORMAT).to_string();
        Self::with_timestamp(body, location, timestamp)
    }

    pub fn with_timestamp(
        body: Option<String>,
        location: Option<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        let body = body
            .filter(|b| !b.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ALERT_BODY.to_string());
        Self {
            body,
            location: location.filter(|l| !l.trim().is_empty()),
            timestamp: timestamp.into(),
        }
    }
}

/// Outcome of delivering an alert to one contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Success,
    Failed,
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryStatus::Success => write!(f, "success"),
            DeliveryStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Per-contact delivery record. Lives only for the triggering request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryResult {
    pub contact_name: String,
    pub status: DeliveryStatus,
    pub channel: String,
    pub error: Option<String>,
}

impl DeliveryResult {
    pub fn success(contact_name: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            contact_name: contact_name.into(),
            status: DeliveryStatus::Success,
            channel: channel.into(),
            error: None,
        }
    }

    pub fn failed(
        contact_name: impl Into<String>,
        channel: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            contact_name: contact_name.into(),
            status: DeliveryStatus::Failed,
            channel: channel.into(),
            error: Some(error.into()),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.status == DeliveryStatus::Success
    }
}

// =============================================================================
// Locations
// =============================================================================

/// A user's last reported position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedLocation {
    pub lat: f64,
    pub lon: f64,
    pub city_hint: Option<String>,
}

impl SavedLocation {
    /// Human-readable form embedded in alerts: `Lat: .., Lon: ..[, Near: ..]`.
    pub fn describe(&self) -> String {
        let mut text = format!("Lat: {}, Lon: {}", self.lat, self.lon);
        if let Some(hint) = self.city_hint.as_deref().filter(|h| !h.trim().is_empty()) {
            text.push_str(&format!(", Near: {}", hint));
        }
        text
    }

    pub fn in_range(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }
}

// =============================================================================
// Status vocabulary
// =============================================================================

/// Outcome kinds reported to programmatic callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiStatus {
    Ok,
    Error,
    Empty,
    Success,
    Partial,
}

impl fmt::Display for ApiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiStatus::Ok => write!(f, "ok"),
            ApiStatus::Error => write!(f, "error"),
            ApiStatus::Empty => write!(f, "empty"),
            ApiStatus::Success => write!(f, "success"),
            ApiStatus::Partial => write!(f, "partial"),
        }
    }
}

impl std::str::FromStr for ApiStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ok" => Ok(ApiStatus::Ok),
            "error" => Ok(ApiStatus::Error),
            "empty" => Ok(ApiStatus::Empty),
            "success" => Ok(ApiStatus::Success),
            "partial" => Ok(ApiStatus::Partial),
            _ => Err(format!("Unknown status: {}", s)),
        }
    }
}

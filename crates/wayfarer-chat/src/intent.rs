//! Keyword heuristics over the raw user text.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::replies::{GATHERING_NOTICE, PLANNING_NOTICE};
use crate::session::LiveLocation;

/// Prefix of a device location report sent by the channel.
pub const LIVE_LOCATION_PREFIX: &str = "[LIVE_LOCATION]";

static LAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"lat=([\-0-9\.]+)").expect("valid latitude regex"));
static LON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"lon=([\-0-9\.]+)").expect("valid longitude regex"));

const EMERGENCY_KEYWORDS: [&str; 4] = ["sos", "emergency", "help me", "urgent"];
const PLANNING_KEYWORDS: [&str; 4] = ["plan", "trip", "days", "itinerary"];
const INFORMATION_KEYWORDS: [&str; 4] = ["weather", "places", "directions", "budget"];

/// Purpose of a query, deciding the synthesis template and enrichment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    PlacesListing,
    WeatherOnly,
    ImageryOnly,
    TripPlanning,
    Generic,
}

impl Intent {
    /// Checked in priority order; the first match wins.
    pub fn classify(query: &str) -> Self {
        let q = query.trim().to_lowercase();
        if q.contains("places to visit") {
            Intent::PlacesListing
        } else if q.contains("weather") && !q.contains("plan") {
            Intent::WeatherOnly
        } else if q.contains("show images") || q.contains("images of") {
            Intent::ImageryOnly
        } else if ["plan", "budget for", "itinerary"].iter().any(|k| q.contains(k)) {
            Intent::TripPlanning
        } else {
            Intent::Generic
        }
    }

    /// Whether synthesis fetches places and per-place images.
    pub fn enriches_places(&self) -> bool {
        matches!(self, Intent::PlacesListing | Intent::TripPlanning)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::PlacesListing => write!(f, "places_listing"),
            Intent::WeatherOnly => write!(f, "weather_only"),
            Intent::ImageryOnly => write!(f, "imagery_only"),
            Intent::TripPlanning => write!(f, "trip_planning"),
            Intent::Generic => write!(f, "generic"),
        }
    }
}

impl std::str::FromStr for Intent {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "places_listing" => Ok(Intent::PlacesListing),
            "weather_only" => Ok(Intent::WeatherOnly),
            "imagery_only" => Ok(Intent::ImageryOnly),
            "trip_planning" => Ok(Intent::TripPlanning),
            "generic" => Ok(Intent::Generic),
            _ => Err(format!("Unknown intent: {}", s)),
        }
    }
}

pub fn is_emergency(text: &str) -> bool {
    let lower = text.to_lowercase();
    EMERGENCY_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Emergency input that is about registering contacts.
pub fn wants_sos_setup(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("add contact") || lower.contains("setup")
}

/// Notice a channel may show while the turn runs.
pub fn progress_notice(text: &str) -> Option<&'static str> {
    if is_emergency(text) {
        return None;
    }
    let lower = text.to_lowercase();
    if PLANNING_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Some(PLANNING_NOTICE)
    } else if INFORMATION_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Some(GATHERING_NOTICE)
    } else {
        None
    }
}

pub fn mentions_nearby(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("near me") || lower.contains("nearby")
}

/// Parse `[LIVE_LOCATION] lat=<f> lon=<f>`.
pub fn parse_live_location(text: &str) -> Option<LiveLocation> {
    let text = text.trim();
    if !text.starts_with(LIVE_LOCATION_PREFIX) {
        return None;
    }
    let lat = LAT.captures(text)?.get(1)?.as_str().parse::<f64>().ok()?;
    let lon = LON.captures(text)?.get(1)?.as_str().parse::<f64>().ok()?;
    Some(LiveLocation { lat, lon })
}

//! Directions between two places.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use wayfarer_core::LocationNormalizer;

use crate::error::{ToolError, ROUTE_SERVICE};
use crate::providers::{RouteSource, RouteSummary};

const MAX_STEPS: usize = 5;

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("Invalid HTML tag regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TravelMode {
    Driving,
    Walking,
    Cycling,
    /// No transit profile exists upstream; routed as driving.
    Transit,
}

impl TravelMode {
    /// Routing profile requested from the provider.
    pub fn profile(&self) -> &'static str {
        match self {
            TravelMode::Driving | TravelMode::Transit => "driving-car",
            TravelMode::Walking => "foot-walking",
            TravelMode::Cycling => "cycling-regular",
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TravelMode::Driving => write!(f, "driving"),
            TravelMode::Walking => write!(f, "walking"),
            TravelMode::Cycling => write!(f, "cycling"),
            TravelMode::Transit => write!(f, "transit"),
        }
    }
}

impl FromStr for TravelMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "driving" => Ok(TravelMode::Driving),
            "walking" => Ok(TravelMode::Walking),
            "bicycling" | "cycling" => Ok(TravelMode::Cycling),
            "transit" => Ok(TravelMode::Transit),
            _ => Err(format!("Unknown travel mode: {}", s)),
        }
    }
}

/// Split "X to Y" or "from X to Y" into origin and destination.
pub fn parse_route_query(query: &str) -> Result<(String, String), ToolError> {
    let lower = query.trim().to_lowercase();
    let lower = lower.strip_prefix("from ").unwrap_or(&lower);
    match lower.split_once(" to ") {
        Some((origin, destination))
            if !origin.trim().is_empty() && !destination.trim().is_empty() =>
        {
            Ok((origin.trim().to_string(), destination.trim().to_string()))
        }
        _ => Err(ToolError::InvalidArguments(
            "Please use format like 'Delhi to Agra' or 'from Mumbai to Goa'".to_string(),
        )),
    }
}

/// Instruction text without markup and with collapsed whitespace.
pub fn clean_instruction(raw: &str) -> String {
    HTML_TAG
        .replace_all(raw, "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// "Xh Ym" from one hour up, otherwise "Ym".
pub fn format_duration(minutes: u64) -> String {
    if minutes >= 60 {
        format!("{}h {}m", minutes / 60, minutes % 60)
    } else {
        format!("{}m", minutes)
    }
}

pub fn format_route(
    from_label: &str,
    to_label: &str,
    origin: &str,
    destination: &str,
    mode: TravelMode,
    route: &RouteSummary,
) -> String {
    let km = (route.distance_m / 100.0).round() / 10.0;
    let minutes = (route.duration_s / 60.0).round().max(0.0) as u64;

    let mut text = format!(
        "🗺️ Route from {} to {}:\n\n📏 Distance: {:.1} km\n⏱️ Duration: {} ({})\n\n",
        from_label,
        to_label,
        km,
        format_duration(minutes),
        mode
    );

    let steps: Vec<String> = route
        .instructions
        .iter()
        .map(|s| clean_instruction(s))
        .filter(|s| !s.is_empty())
        .take(MAX_STEPS)
        .collect();
    if !steps.is_empty() {
        text.push_str("🛣️ Main directions:\n");
        for (i, step) in steps.iter().enumerate() {
            text.push_str(&format!("{}. {}\n", i + 1, step));
        }
        text.push('\n');
    }

    text.push_str(&format!(
        "🔗 Full directions: https://www.google.com/maps/dir/{}/{}\n\n",
        origin.replace(' ', "+"),
        destination.replace(' ', "+")
    ));
    text.push_str("💡 Plan your journey considering Indian traffic conditions!");
    text
}

pub async fn run(
    source: Option<&dyn RouteSource>,
    normalizer: &LocationNormalizer,
    query: &str,
    mode: &str,
) -> Result<String, ToolError> {
    let (origin, destination) = parse_route_query(query)?;
    let mode: TravelMode = mode.parse().map_err(|_| {
        ToolError::InvalidArguments("Unsupported mode. Use: driving, walking, bicycling.".to_string())
    })?;
    let source = source.ok_or(ToolError::NotConfigured(ROUTE_SERVICE))?;

    let from_res = normalizer.normalize(&origin);
    let to_res = normalizer.normalize(&destination);
    let (origin, destination) = (from_res.resolved_name.as_str(), to_res.resolved_name.as_str());

    let not_found = |addr: &str| {
        ToolError::NotFound(format!("Location '{}' not found. Try more specific name.", addr))
    };
    let from = source
        .geocode(origin)
        .await?
        .ok_or_else(|| not_found(origin))?;
    let to = source
        .geocode(destination)
        .await?
        .ok_or_else(|| not_found(destination))?;

    let route = source
        .directions(mode.profile(), &from, &to)
        .await?
        .ok_or_else(|| {
            ToolError::NotFound(format!("No route found from {} to {}.", origin, destination))
        })?;

    let body = format_route(&from.label, &to.label, origin, destination, mode, &route);
    let notice = if from_res.needs_confirmation || to_res.needs_confirmation {
        format!(
            "🔍 Did you mean '{}' to '{}'? Let me get directions anyway.\n\n",
            origin, destination
        )
    } else if from_res.was_corrected || to_res.was_corrected {
        format!("📍 Directions from {} to {}:\n\n", origin, destination)
    } else {
        String::new()
    };
    Ok(notice + &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::RoutePoint;
    use async_trait::async_trait;
    use std::sync::Mutex;

    // ---- Parsing ----

    #[test]
    fn test_parse_route_query_forms() {
        assert_eq!(
            parse_route_query("Delhi to Agra").unwrap(),
            ("delhi".to_string(), "agra".to_string())
        );
        assert_eq!(
            parse_route_query("from Mumbai to Goa").unwrap(),
            ("mumbai".to_string(), "goa".to_string())
        );
        assert!(parse_route_query("Delhi Agra").is_err());
        assert!(parse_route_query(" to Agra").is_err());
    }

    #[test]
    fn test_travel_mode_parsing() {
        assert_eq!("bicycling".parse::<TravelMode>().unwrap().profile(), "cycling-regular");
        assert_eq!("Transit".parse::<TravelMode>().unwrap().profile(), "driving-car");
        assert_eq!("".parse::<TravelMode>().unwrap(), TravelMode::Driving);
        assert!("flying".parse::<TravelMode>().is_err());
    }

    // ---- Formatting ----

    #[test]
    fn test_clean_instruction() {
        assert_eq!(
            clean_instruction("Turn <b>left</b>  onto\n<div>NH 19</div>"),
            "Turn left onto NH 19"
        );
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(45), "45m");
        assert_eq!(format_duration(60), "1h 0m");
        assert_eq!(format_duration(210), "3h 30m");
    }

    #[test]
    fn test_format_route() {
        let route = RouteSummary {
            distance_m: 233_440.0,
            duration_s: 12_600.0,
            instructions: (1..=7).map(|i| format!("Step <b>{}</b>", i)).collect(),
        };
        let text = format_route("Delhi, India", "Agra, India", "Delhi", "Agra", TravelMode::Driving, &route);
        assert!(text.starts_with("🗺️ Route from Delhi, India to Agra, India:\n\n"));
        assert!(text.contains("📏 Distance: 233.4 km\n⏱️ Duration: 3h 30m (driving)"));
        assert!(text.contains("5. Step 5\n"));
        assert!(!text.contains("Step 6"));
        assert!(text.contains("https://www.google.com/maps/dir/Delhi/Agra"));
    }

    #[test]
    fn test_format_route_without_steps() {
        let route = RouteSummary {
            distance_m: 1_000.0,
            duration_s: 600.0,
            instructions: vec![],
        };
        let text = format_route("A", "B", "mount abu", "udaipur", TravelMode::Walking, &route);
        assert!(!text.contains("Main directions"));
        assert!(text.contains("⏱️ Duration: 10m (walking)"));
        assert!(text.contains("/dir/mount+abu/udaipur"));
    }

    // ---- Run ----

    struct FixedRoutes {
        profiles: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl RouteSource for FixedRoutes {
        async fn geocode(&self, address: &str) -> Result<Option<RoutePoint>, ToolError> {
            Ok(Some(RoutePoint {
                lon: 77.0,
                lat: 28.0,
                label: format!("{}, India", address),
            }))
        }

        async fn directions(
            &self,
            profile: &str,
            _from: &RoutePoint,
            _to: &RoutePoint,
        ) -> Result<Option<RouteSummary>, ToolError> {
            self.profiles.lock().unwrap().push(profile.to_string());
            Ok(Some(RouteSummary {
                distance_m: 5_000.0,
                duration_s: 900.0,
                instructions: vec![],
            }))
        }
    }

    #[tokio::test]
    async fn test_run_corrected_endpoint_notice() {
        let source = FixedRoutes {
            profiles: Mutex::new(Vec::new()),
        };
        let text = run(Some(&source), &LocationNormalizer::default(), "delhii to agra", "walking")
            .await
            .unwrap();
        assert!(text.starts_with("📍 Directions from Delhi to Agra:\n\n🗺️"));
        assert_eq!(source.profiles.lock().unwrap().as_slice(), ["foot-walking"]);
    }

    #[tokio::test]
    async fn test_run_rejects_unknown_mode() {
        let source = FixedRoutes {
            profiles: Mutex::new(Vec::new()),
        };
        let err = run(Some(&source), &LocationNormalizer::default(), "Delhi to Agra", "boat")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Unsupported mode. Use: driving, walking, bicycling.");
    }

    #[tokio::test]
    async fn test_run_not_configured() {
        let err = run(None, &LocationNormalizer::default(), "Delhi to Agra", "driving")
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotConfigured(_)));
    }
}

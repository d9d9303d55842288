//! Points of interest around a destination.
//!
//! The feature index is searched inside the geocoded bounding box, widened
//! step by step until enough distinct places turn up. A named-entity search
//! then tops up short lists without displacing what was already found.

use std::collections::HashSet;

use tracing::{debug, warn};
use wayfarer_core::location::title_case;
use wayfarer_core::LocationNormalizer;

use crate::error::{ToolError, PLACES_SERVICE};
use crate::providers::{BoundingBox, FeatureIndex, Geocoder, Place, PlaceCategory};
use crate::tools::{annotate, required};

/// Bounding-box widening factors, tried in order.
pub const WIDENING_FACTORS: [f64; 3] = [1.0, 1.8, 3.5];

/// Enough distinct results to stop widening.
pub const MIN_RESULTS: usize = 3;

const MAX_FEATURES: usize = 30;
const MAX_LISTED: usize = 10;
const NAMED_SEARCH_LIMIT: usize = 20;

fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Append `extra` to `base`, skipping names already present.
pub fn merge_places(mut base: Vec<Place>, extra: Vec<Place>) -> Vec<Place> {
    let mut seen: HashSet<String> = base.iter().map(|p| name_key(&p.name)).collect();
    for place in extra {
        if seen.insert(name_key(&place.name)) {
            base.push(place);
        }
    }
    base
}

fn category_suffix(place: &Place) -> String {
    match place.category.as_deref().map(str::trim) {
        Some(cat)
            if !cat.is_empty()
                && !cat.eq_ignore_ascii_case(&place.name)
                && !cat.eq_ignore_ascii_case("place") =>
        {
            format!(" ({})", title_case(&cat.replace('_', " ")))
        }
        _ => String::new(),
    }
}

fn detail_line(place_type: &str) -> Option<&'static str> {
    match place_type {
        "tourism" => Some("   🎫 Entry: Check current rates at entrance or official site."),
        "restaurant" => Some("   💰 Cost: Check menu or call the restaurant."),
        "hotel" => Some("   🏨 Rates: Check booking platforms for live rates."),
        _ => None,
    }
}

pub fn format_places(location: &str, place_type: &str, places: &[Place]) -> String {
    let mut lines = vec![
        format!(
            "🏛️ **{} in {}:**",
            title_case(&place_type.replace('_', " ")),
            title_case(location)
        ),
        String::new(),
    ];
    for place in places.iter().take(MAX_LISTED) {
        lines.push(format!("📍 **{}**{}", place.name, category_suffix(place)));
        if let (Some(lat), Some(lon)) = (place.lat, place.lon) {
            lines.push(format!("   📌 Coordinates: {}, {}", lat, lon));
        }
        if let Some(detail) = detail_line(place_type) {
            lines.push(detail.to_string());
        }
        lines.push(String::new());
    }
    lines.push(
        "💡 **Tip:** Results prefer named OSM features. For small towns, try a nearby larger city (e.g., 'Kochi')."
            .to_string(),
    );
    lines.join("\n")
}

/// Search the feature index with progressively wider boxes.
///
/// Returns the first result set with at least [`MIN_RESULTS`] places,
/// otherwise the first non-empty partial set. The error is only returned
/// when every attempt failed.
async fn widen_search(
    features: &dyn FeatureIndex,
    bbox: BoundingBox,
    category: PlaceCategory,
) -> Result<Vec<Place>, ToolError> {
    let mut partial: Vec<Place> = Vec::new();
    let mut last_error = None;
    let mut any_ok = false;

    for factor in WIDENING_FACTORS {
        match features.search(bbox.scaled(factor), category, MAX_FEATURES).await {
            Ok(found) => {
                any_ok = true;
                debug!(factor, count = found.len(), "Feature search");
                if found.len() >= MIN_RESULTS {
                    return Ok(found);
                }
                if partial.is_empty() {
                    partial = found;
                }
            }
            Err(e) => {
                warn!(factor, error = %e, "Feature search failed");
                last_error = Some(e);
            }
        }
    }

    match (any_ok, last_error) {
        (false, Some(e)) => Err(e),
        _ => Ok(partial),
    }
}

pub async fn run(
    geocoder: Option<&dyn Geocoder>,
    features: Option<&dyn FeatureIndex>,
    normalizer: &LocationNormalizer,
    location: &str,
    place_type: &str,
) -> Result<String, ToolError> {
    let location = required(location, "Provide a valid location.")?;
    let place_type = match place_type.trim().to_lowercase() {
        t if t.is_empty() => "tourism".to_string(),
        t => t,
    };
    let resolution = normalizer.normalize(location);
    let name = resolution.resolved_name.as_str();
    let geocoder = geocoder.ok_or(ToolError::NotConfigured(PLACES_SERVICE))?;
    let features = features.ok_or(ToolError::NotConfigured(PLACES_SERVICE))?;

    let not_found = || {
        ToolError::NotFound(format!(
            "No {} places found for '{}'. Try a larger nearby city or check spelling.",
            place_type, name
        ))
    };

    let point = geocoder.locate(name).await?.ok_or_else(not_found)?;
    let category = PlaceCategory::from_label(&place_type);

    let mut failure = None;
    let mut places = match widen_search(features, point.bbox, category).await {
        Ok(places) => places,
        Err(e) => {
            failure = Some(e);
            Vec::new()
        }
    };

    if places.len() < MIN_RESULTS {
        let query = format!("{} {}", place_type, name);
        match geocoder.search_named(&query, NAMED_SEARCH_LIMIT).await {
            Ok(named) => {
                failure = None;
                places = merge_places(places, named);
            }
            Err(e) => warn!(error = %e, "Named place search failed"),
        }
    }

    if places.is_empty() {
        return Err(failure.unwrap_or_else(not_found));
    }

    Ok(annotate(
        &resolution,
        format_places(name, &place_type, &places),
        |n| format!("🔍 Did you mean '{}'? Let me show places there anyway.\n\n", n),
        |n| format!("📍 Showing places in {}:\n\n", n),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::GeoPoint;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn place(name: &str, category: Option<&str>) -> Place {
        Place {
            name: name.to_string(),
            category: category.map(str::to_string),
            lat: Some(15.5),
            lon: Some(73.8),
        }
    }

    struct FixedGeocoder {
        named: Result<Vec<Place>, ()>,
        named_queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Geocoder for FixedGeocoder {
        async fn locate(&self, query: &str) -> Result<Option<GeoPoint>, ToolError> {
            if query == "Qqzzxv" {
                return Ok(None);
            }
            Ok(Some(GeoPoint {
                lat: 15.5,
                lon: 73.8,
                bbox: BoundingBox::around(15.5, 73.8, 0.03),
            }))
        }

        async fn search_named(&self, query: &str, _limit: usize) -> Result<Vec<Place>, ToolError> {
            self.named_queries.lock().unwrap().push(query.to_string());
            self.named
                .clone()
                .map_err(|_| ToolError::Timeout(crate::error::LOCATION_SERVICE))
        }

        async fn reverse(&self, _lat: f64, _lon: f64) -> Result<Option<String>, ToolError> {
            Ok(None)
        }
    }

    /// Returns the scripted result for each successive widening step.
    struct ScriptedIndex {
        steps: Mutex<Vec<Result<Vec<Place>, ToolError>>>,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl FeatureIndex for ScriptedIndex {
        async fn search(
            &self,
            _bbox: BoundingBox,
            _category: PlaceCategory,
            _max: usize,
        ) -> Result<Vec<Place>, ToolError> {
            *self.calls.lock().unwrap() += 1;
            let mut steps = self.steps.lock().unwrap();
            if steps.is_empty() {
                Ok(Vec::new())
            } else {
                steps.remove(0)
            }
        }
    }

    fn geocoder(named: Result<Vec<Place>, ()>) -> FixedGeocoder {
        FixedGeocoder {
            named,
            named_queries: Mutex::new(Vec::new()),
        }
    }

    fn index(steps: Vec<Result<Vec<Place>, ToolError>>) -> ScriptedIndex {
        ScriptedIndex {
            steps: Mutex::new(steps),
            calls: Mutex::new(0),
        }
    }

    // ---- Merging and formatting ----

    #[test]
    fn test_merge_keeps_order_and_skips_duplicates() {
        let base = vec![place("Fort Aguada", None), place("Basilica", None)];
        let extra = vec![place("basilica ", None), place("Chapora Fort", None)];
        let merged = merge_places(base, extra);
        let names: Vec<&str> = merged.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Fort Aguada", "Basilica", "Chapora Fort"]);
    }

    #[test]
    fn test_format_places_category_rules() {
        let places = vec![
            place("Fort Aguada", Some("attraction")),
            place("Church", Some("church")),
            place("Plaza", Some("Place")),
            place("Old Quarter", Some("historic_district")),
        ];
        let text = format_places("goa", "tourism", &places);
        assert!(text.starts_with("🏛️ **Tourism in Goa:**\n\n📍 **Fort Aguada** (Attraction)\n"));
        assert!(text.contains("📍 **Church**\n"));
        assert!(text.contains("📍 **Plaza**\n"));
        assert!(text.contains("📍 **Old Quarter** (Historic District)\n"));
        assert!(text.contains("   📌 Coordinates: 15.5, 73.8\n   🎫 Entry:"));
        assert!(text.ends_with("(e.g., 'Kochi')."));
    }

    #[test]
    fn test_format_places_lists_at_most_ten() {
        let places: Vec<Place> = (0..15).map(|i| place(&format!("P{}", i), None)).collect();
        let text = format_places("goa", "restaurant", &places);
        assert_eq!(text.matches("📍 **").count(), 10);
        assert!(text.contains("💰 Cost:"));
    }

    // ---- Widening ----

    #[tokio::test]
    async fn test_stops_widening_at_three_results() {
        let idx = index(vec![
            Ok(vec![place("A", None)]),
            Ok(vec![place("A", None), place("B", None), place("C", None)]),
        ]);
        let geo = geocoder(Ok(vec![]));
        let text = run(Some(&geo), Some(&idx), &LocationNormalizer::default(), "Goa", "tourism")
            .await
            .unwrap();
        assert_eq!(*idx.calls.lock().unwrap(), 2);
        assert!(text.contains("**C**"));
        assert!(geo.named_queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_partial_results_merged_with_named_search() {
        let idx = index(vec![Ok(vec![place("Fort Aguada", None)])]);
        let geo = geocoder(Ok(vec![place("fort aguada", None), place("Baga Beach", None)]));
        let text = run(Some(&geo), Some(&idx), &LocationNormalizer::default(), "goa", "tourism")
            .await
            .unwrap();
        assert_eq!(*idx.calls.lock().unwrap(), 3);
        assert_eq!(geo.named_queries.lock().unwrap().as_slice(), ["tourism Goa"]);
        let first = text.find("Fort Aguada").unwrap();
        let second = text.find("Baga Beach").unwrap();
        assert!(first < second);
        assert_eq!(text.matches("📍 **").count(), 2);
    }

    #[tokio::test]
    async fn test_all_failures_report_transport_error() {
        let idx = index(vec![
            Err(ToolError::Timeout(PLACES_SERVICE)),
            Err(ToolError::Timeout(PLACES_SERVICE)),
            Err(ToolError::Timeout(PLACES_SERVICE)),
        ]);
        let geo = geocoder(Err(()));
        let err = run(Some(&geo), Some(&idx), &LocationNormalizer::default(), "Goa", "tourism")
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_nothing_found_is_not_found() {
        let idx = index(vec![]);
        let geo = geocoder(Ok(vec![]));
        let err = run(Some(&geo), Some(&idx), &LocationNormalizer::default(), "Goa", "hotel")
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "No hotel places found for 'Goa'. Try a larger nearby city or check spelling."
        );
    }

    #[tokio::test]
    async fn test_unknown_location() {
        let idx = index(vec![]);
        let geo = geocoder(Ok(vec![]));
        let err = run(Some(&geo), Some(&idx), &LocationNormalizer::default(), "Qqzzxv", "")
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
        assert_eq!(*idx.calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_location() {
        let err = run(None, None, &LocationNormalizer::default(), "", "tourism")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Provide a valid location.");
    }
}

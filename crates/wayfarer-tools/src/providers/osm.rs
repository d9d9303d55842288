//! OpenStreetMap services: Nominatim geocoding and the Overpass feature index.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ToolError, LOCATION_SERVICE, PLACES_SERVICE};
use crate::http;
use crate::providers::{BoundingBox, FeatureIndex, GeoPoint, Geocoder, Place, PlaceCategory};

/// Half-size of the box used when Nominatim returns no bounding box.
const DEFAULT_BOX_DELTA: f64 = 0.03;

// =============================================================================
// Nominatim
// =============================================================================

#[derive(Debug, Clone)]
pub struct Nominatim {
    client: reqwest::Client,
    base_url: String,
}

impl Nominatim {
    pub fn new(base_url: &str, user_agent: &str) -> Result<Self, ToolError> {
        Ok(Self {
            client: http::build_client(LOCATION_SERVICE, Duration::from_secs(10), user_agent)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    lat: Option<String>,
    lon: Option<String>,
    #[serde(default)]
    boundingbox: Vec<String>,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    namedetails: Option<Value>,
    #[serde(rename = "type")]
    kind: Option<String>,
    class: Option<String>,
    importance: Option<f64>,
}

impl SearchItem {
    fn coords(&self) -> Option<(f64, f64)> {
        let lat = self.lat.as_deref()?.parse().ok()?;
        let lon = self.lon.as_deref()?.parse().ok()?;
        Some((lat, lon))
    }

    fn name(&self) -> Option<String> {
        let named = self
            .namedetails
            .as_ref()
            .and_then(|n| n.get("name"))
            .and_then(|n| n.as_str())
            .map(str::trim)
            .filter(|n| !n.is_empty());
        let name = match named {
            Some(n) => n.to_string(),
            None => self.display_name.split(',').next()?.trim().to_string(),
        };
        (!name.is_empty()).then_some(name)
    }
}

/// Parse a Nominatim `[south, north, west, east]` box.
fn parse_bbox(raw: &[String]) -> Option<BoundingBox> {
    if raw.len() != 4 {
        return None;
    }
    let v: Vec<f64> = raw.iter().filter_map(|s| s.parse().ok()).collect();
    (v.len() == 4).then(|| BoundingBox {
        south: v[0],
        north: v[1],
        west: v[2],
        east: v[3],
    })
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    address: Option<Value>,
    display_name: Option<String>,
}

/// "City, Country" from a reverse lookup, else the display name.
fn reverse_label(resp: ReverseResponse) -> Option<String> {
    let field = |key: &str| {
        resp.address
            .as_ref()
            .and_then(|a| a.get(key))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    };
    let city = ["city", "town", "village", "state_district", "state"]
        .iter()
        .find_map(|k| field(k));
    match (city, field("country")) {
        (Some(city), Some(country)) => Some(format!("{}, {}", city, country)),
        _ => resp.display_name,
    }
}

#[async_trait]
impl Geocoder for Nominatim {
    async fn locate(&self, query: &str) -> Result<Option<GeoPoint>, ToolError> {
        let request = self
            .client
            .get(format!("{}/search", self.base_url))
            .header("Accept-Language", "en")
            .query(&[("q", query), ("format", "json"), ("limit", "1"), ("addressdetails", "1")]);
        let items: Option<Vec<SearchItem>> = http::fetch_json(LOCATION_SERVICE, request).await?;

        let Some(item) = items.and_then(|v| v.into_iter().next()) else {
            return Ok(None);
        };
        let Some((lat, lon)) = item.coords() else {
            return Err(ToolError::Malformed(LOCATION_SERVICE));
        };
        let bbox = parse_bbox(&item.boundingbox)
            .unwrap_or_else(|| BoundingBox::around(lat, lon, DEFAULT_BOX_DELTA));
        Ok(Some(GeoPoint { lat, lon, bbox }))
    }

    async fn search_named(&self, query: &str, limit: usize) -> Result<Vec<Place>, ToolError> {
        let limit = limit.to_string();
        let request = self
            .client
            .get(format!("{}/search", self.base_url))
            .timeout(Duration::from_secs(12))
            .header("Accept-Language", "en")
            .query(&[
                ("q", query),
                ("format", "json"),
                ("limit", limit.as_str()),
                ("addressdetails", "1"),
                ("extratags", "1"),
                ("namedetails", "1"),
            ]);
        let items: Vec<SearchItem> = http::fetch_json(LOCATION_SERVICE, request)
            .await?
            .unwrap_or_default();

        let mut seen = HashSet::new();
        let mut ranked: Vec<(f64, Place)> = Vec::new();
        for item in items {
            let Some(name) = item.name() else { continue };
            if !seen.insert(name.to_lowercase()) {
                continue;
            }
            let coords = item.coords();
            ranked.push((
                item.importance.unwrap_or(0.0),
                Place {
                    name,
                    category: item.kind.clone().or_else(|| item.class.clone()),
                    lat: coords.map(|c| c.0),
                    lon: coords.map(|c| c.1),
                },
            ));
        }
        // Stable sort keeps provider order among equal importance.
        ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        Ok(ranked.into_iter().map(|(_, p)| p).collect())
    }

    async fn reverse(&self, lat: f64, lon: f64) -> Result<Option<String>, ToolError> {
        let (lat, lon) = (lat.to_string(), lon.to_string());
        let request = self
            .client
            .get(format!("{}/reverse", self.base_url))
            .header("Accept-Language", "en")
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("format", "json"),
                ("zoom", "10"),
                ("addressdetails", "1"),
            ]);
        let response: Option<ReverseResponse> = http::fetch_json(LOCATION_SERVICE, request).await?;
        Ok(response.and_then(reverse_label))
    }
}

// =============================================================================
// Overpass
// =============================================================================

#[derive(Debug, Clone)]
pub struct Overpass {
    client: reqwest::Client,
    url: String,
}

impl Overpass {
    pub fn new(url: &str, user_agent: &str) -> Result<Self, ToolError> {
        Ok(Self {
            client: http::build_client(PLACES_SERVICE, Duration::from_secs(30), user_agent)?,
            url: url.to_string(),
        })
    }
}

fn tag_groups(category: PlaceCategory) -> &'static [&'static str] {
    match category {
        PlaceCategory::Tourism => &[
            r#"node["tourism"="attraction"]"#,
            r#"way["tourism"="attraction"]"#,
            r#"relation["tourism"="attraction"]"#,
            r#"node["tourism"="viewpoint"]"#,
            r#"way["tourism"="viewpoint"]"#,
            r#"relation["tourism"="viewpoint"]"#,
            r#"node["tourism"="museum"]"#,
            r#"node["tourism"="gallery"]"#,
            r#"node["historic"]"#,
            r#"node["leisure"="park"]"#,
            r#"node["natural"="peak"]"#,
            r#"node["natural"="waterfall"]"#,
            r#"node["amenity"="theatre"]"#,
            r#"node["tourism"="information"]"#,
            r#"node["place"="locality"]"#,
        ],
        PlaceCategory::Restaurant => &[
            r#"node["amenity"="restaurant"]"#,
            r#"way["amenity"="restaurant"]"#,
            r#"relation["amenity"="restaurant"]"#,
        ],
        PlaceCategory::Hotel => &[
            r#"node["tourism"="hotel"]"#,
            r#"way["tourism"="hotel"]"#,
            r#"relation["tourism"="hotel"]"#,
        ],
        PlaceCategory::Named => &[r#"node["name"]"#, r#"way["name"]"#, r#"relation["name"]"#],
    }
}

/// Overpass QL for every tag group of `category` inside `bbox`.
pub fn build_overpass_query(bbox: &BoundingBox, category: PlaceCategory) -> String {
    let area = format!("({},{},{},{});", bbox.south, bbox.west, bbox.north, bbox.east);
    let body: String = tag_groups(category)
        .iter()
        .map(|group| format!("{}{}", group, area))
        .collect();
    format!("[out:json][timeout:25];({});out center;", body)
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<Element>,
}

#[derive(Debug, Deserialize)]
struct Element {
    #[serde(rename = "type")]
    kind: String,
    lat: Option<f64>,
    lon: Option<f64>,
    center: Option<Center>,
    #[serde(default)]
    tags: std::collections::HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct Center {
    lat: f64,
    lon: f64,
}

fn parse_elements(response: OverpassResponse, max_results: usize) -> Vec<Place> {
    let mut seen = HashSet::new();
    let mut places = Vec::new();
    for el in response.elements {
        let Some(name) = el.tags.get("name").map(|n| n.trim()).filter(|n| !n.is_empty()) else {
            continue;
        };
        if !seen.insert(name.to_lowercase()) {
            continue;
        }
        let (lat, lon) = if el.kind == "node" {
            (el.lat, el.lon)
        } else {
            (el.center.as_ref().map(|c| c.lat), el.center.as_ref().map(|c| c.lon))
        };
        let category = ["tourism", "amenity", "historic", "leisure", "natural"]
            .iter()
            .find_map(|k| el.tags.get(*k).cloned())
            .unwrap_or_else(|| "Place".to_string());
        places.push(Place {
            name: name.to_string(),
            category: Some(category),
            lat,
            lon,
        });
        if places.len() >= max_results {
            break;
        }
    }
    places
}

#[async_trait]
impl FeatureIndex for Overpass {
    async fn search(
        &self,
        bbox: BoundingBox,
        category: PlaceCategory,
        max_results: usize,
    ) -> Result<Vec<Place>, ToolError> {
        let request = self
            .client
            .post(&self.url)
            .body(build_overpass_query(&bbox, category));
        let response: Option<OverpassResponse> = http::fetch_json(PLACES_SERVICE, request).await?;
        Ok(response
            .map(|r| parse_elements(r, max_results))
            .unwrap_or_default())
    }
}

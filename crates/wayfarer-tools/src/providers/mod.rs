//! External data sources behind the capability tools.
//!
//! Each trait is the whole contract a tool has with its backing API, so a
//! source can be swapped (or mocked in tests) without touching tool logic.
//! The HTTP implementations live in the submodules.

pub mod booking;
pub mod newsapi;
pub mod openroute;
pub mod openweather;
pub mod osm;
pub mod unsplash;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use wayfarer_core::config::ServicesConfig;

use crate::error::ToolError;

// =============================================================================
// Value types
// =============================================================================

/// Current conditions at one location.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub city: String,
    pub country: String,
    pub temp_c: f64,
    pub feels_like_c: f64,
    pub description: String,
    pub humidity: u32,
    pub wind_speed: f64,
}

/// Axis-aligned box in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    /// Square box of `±delta` degrees around a point.
    pub fn around(lat: f64, lon: f64, delta: f64) -> Self {
        Self {
            south: lat - delta,
            west: lon - delta,
            north: lat + delta,
            east: lon + delta,
        }
    }

    /// Same centre, each half-extent multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        let mid_lat = (self.south + self.north) / 2.0;
        let mid_lon = (self.west + self.east) / 2.0;
        let half_lat = (self.north - self.south) / 2.0 * factor;
        let half_lon = (self.east - self.west) / 2.0 * factor;
        Self {
            south: mid_lat - half_lat,
            west: mid_lon - half_lon,
            north: mid_lat + half_lat,
            east: mid_lon + half_lon,
        }
    }
}

/// A geocoded location with its extent.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
    pub bbox: BoundingBox,
}

/// A named point of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub category: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// What kind of points of interest to search for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceCategory {
    Tourism,
    Restaurant,
    Hotel,
    /// Anything carrying a name.
    Named,
}

impl PlaceCategory {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "tourism" | "attractions" | "sightseeing" => PlaceCategory::Tourism,
            "restaurant" | "restaurants" | "food" => PlaceCategory::Restaurant,
            "hotel" | "hotels" => PlaceCategory::Hotel,
            _ => PlaceCategory::Named,
        }
    }
}

/// Routing endpoint resolved by the route provider.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePoint {
    pub lon: f64,
    pub lat: f64,
    pub label: String,
}

/// Summary of the first route returned.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSummary {
    pub distance_m: f64,
    pub duration_s: f64,
    /// Turn-by-turn instructions of the first segment, raw (may contain HTML).
    pub instructions: Vec<String>,
}

/// Parameters of a lodging availability search.
#[derive(Debug, Clone, PartialEq)]
pub struct LodgingQuery {
    pub location: String,
    pub checkin: NaiveDate,
    pub checkout: NaiveDate,
    pub price_range: Option<(u32, u32)>,
}

/// One photo from the image index.
#[derive(Debug, Clone, PartialEq)]
pub struct Photo {
    pub description: Option<String>,
    pub photographer: String,
    pub url: String,
}

/// One news article.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub title: String,
    pub description: Option<String>,
    pub source: String,
    pub published_at: Option<String>,
    pub url: String,
}

// =============================================================================
// Source traits
// =============================================================================

#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// `Ok(None)` when the location is unknown to the provider.
    async fn current(&self, location: &str) -> Result<Option<WeatherReport>, ToolError>;
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// First match for a free-text location.
    async fn locate(&self, query: &str) -> Result<Option<GeoPoint>, ToolError>;

    /// Named-entity search, most important first.
    async fn search_named(&self, query: &str, limit: usize) -> Result<Vec<Place>, ToolError>;

    /// "City, Country" (or the provider's display name) for a coordinate.
    async fn reverse(&self, lat: f64, lon: f64) -> Result<Option<String>, ToolError>;
}

#[async_trait]
pub trait FeatureIndex: Send + Sync {
    /// Distinct named features inside `bbox`, at most `max_results`.
    async fn search(
        &self,
        bbox: BoundingBox,
        category: PlaceCategory,
        max_results: usize,
    ) -> Result<Vec<Place>, ToolError>;
}

#[async_trait]
pub trait RouteSource: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Option<RoutePoint>, ToolError>;

    async fn directions(
        &self,
        profile: &str,
        from: &RoutePoint,
        to: &RoutePoint,
    ) -> Result<Option<RouteSummary>, ToolError>;
}

#[async_trait]
pub trait LodgingSource: Send + Sync {
    /// Number of properties found, `Ok(None)` when the location is unknown.
    async fn search(&self, query: &LodgingQuery) -> Result<Option<usize>, ToolError>;
}

#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn search(&self, query: &str, per_page: usize) -> Result<Vec<Photo>, ToolError>;
}

#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn search(&self, query: &str, from: NaiveDate) -> Result<Vec<Article>, ToolError>;
}

// =============================================================================
// Provider set
// =============================================================================

/// The data sources available to the tool registry. A `None` source means
/// its credential is not configured.
#[derive(Clone, Default)]
pub struct Providers {
    pub weather: Option<Arc<dyn WeatherSource>>,
    pub geocoder: Option<Arc<dyn Geocoder>>,
    pub features: Option<Arc<dyn FeatureIndex>>,
    pub routes: Option<Arc<dyn RouteSource>>,
    pub lodging: Option<Arc<dyn LodgingSource>>,
    pub images: Option<Arc<dyn ImageSource>>,
    pub news: Option<Arc<dyn NewsSource>>,
}

impl Providers {
    /// HTTP providers for every service whose credentials are configured.
    /// OpenStreetMap services need no key and are always present.
    pub fn from_config(config: &ServicesConfig) -> Result<Self, ToolError> {
        let key = |v: &Option<String>| v.clone().filter(|k| !k.trim().is_empty());

        let osm = Arc::new(osm::Nominatim::new(&config.nominatim_url, &config.user_agent)?);
        let overpass = Arc::new(osm::Overpass::new(&config.overpass_url, &config.user_agent)?);

        let weather: Option<Arc<dyn WeatherSource>> = match key(&config.openweather_api_key) {
            Some(k) => Some(Arc::new(openweather::OpenWeather::new(
                &config.openweather_url,
                k,
                &config.user_agent,
            )?)),
            None => None,
        };

        let routes: Option<Arc<dyn RouteSource>> = match key(&config.openrouteservice_api_key) {
            Some(k) => Some(Arc::new(openroute::OpenRouteService::new(
                &config.openrouteservice_url,
                k,
                &config.user_agent,
            )?)),
            None => None,
        };

        let lodging: Option<Arc<dyn LodgingSource>> = match (
            key(&config.rapidapi_key),
            key(&config.rapidapi_host),
            key(&config.rapidapi_base_url),
        ) {
            (Some(k), Some(host), Some(base)) => Some(Arc::new(booking::RapidApiBooking::new(
                &base,
                k,
                host,
                &config.user_agent,
            )?)),
            _ => None,
        };

        let images: Option<Arc<dyn ImageSource>> = match key(&config.unsplash_access_key) {
            Some(k) => Some(Arc::new(unsplash::Unsplash::new(
                &config.unsplash_url,
                k,
                &config.user_agent,
            )?)),
            None => None,
        };

        let news: Option<Arc<dyn NewsSource>> = match key(&config.news_api_key) {
            Some(k) => Some(Arc::new(newsapi::NewsApi::new(
                &config.newsapi_url,
                k,
                &config.user_agent,
            )?)),
            None => None,
        };

        let providers = Self {
            weather,
            geocoder: Some(osm),
            features: Some(overpass),
            routes,
            lodging,
            images,
            news,
        };
        info!(configured = ?providers.configured(), "Data providers ready");
        Ok(providers)
    }

    /// Names of the configured sources, for logging and status output.
    pub fn configured(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.weather.is_some() {
            names.push("weather");
        }
        if self.geocoder.is_some() {
            names.push("geocoder");
        }
        if self.features.is_some() {
            names.push("features");
        }
        if self.routes.is_some() {
            names.push("routes");
        }
        if self.lodging.is_some() {
            names.push("lodging");
        }
        if self.images.is_some() {
            names.push("images");
        }
        if self.news.is_some() {
            names.push("news");
        }
        names
    }
}

impl std::fmt::Debug for Providers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Providers")
            .field("configured", &self.configured())
            .finish()
    }
}

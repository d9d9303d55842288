//! OpenRouteService geocoding and directions.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::error::{ToolError, ROUTE_SERVICE};
use crate::http;
use crate::providers::{RoutePoint, RouteSource, RouteSummary};

#[derive(Debug, Clone)]
pub struct OpenRouteService {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenRouteService {
    pub fn new(base_url: &str, api_key: String, user_agent: &str) -> Result<Self, ToolError> {
        Ok(Self {
            client: http::build_client(ROUTE_SERVICE, Duration::from_secs(20), user_agent)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Geometry,
    #[serde(default)]
    properties: FeatureProperties,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    coordinates: Vec<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct FeatureProperties {
    label: Option<String>,
}

fn first_point(response: GeocodeResponse, address: &str) -> Option<RoutePoint> {
    let feature = response.features.into_iter().next()?;
    let (lon, lat) = match feature.geometry.coordinates.as_slice() {
        [lon, lat, ..] => (*lon, *lat),
        _ => return None,
    };
    Some(RoutePoint {
        lon,
        lat,
        label: feature
            .properties
            .label
            .unwrap_or_else(|| address.to_string()),
    })
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<Route>,
}

#[derive(Debug, Deserialize)]
struct Route {
    summary: Summary,
    #[serde(default)]
    segments: Vec<Segment>,
}

#[derive(Debug, Default, Deserialize)]
struct Summary {
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct Segment {
    #[serde(default)]
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
struct Step {
    #[serde(default)]
    instruction: String,
}

fn first_route(response: DirectionsResponse) -> Option<RouteSummary> {
    let route = response.routes.into_iter().next()?;
    let instructions = route
        .segments
        .into_iter()
        .next()
        .map(|s| s.steps.into_iter().map(|st| st.instruction).collect())
        .unwrap_or_default();
    Some(RouteSummary {
        distance_m: route.summary.distance,
        duration_s: route.summary.duration,
        instructions,
    })
}

#[async_trait]
impl RouteSource for OpenRouteService {
    async fn geocode(&self, address: &str) -> Result<Option<RoutePoint>, ToolError> {
        let request = self
            .client
            .get(format!("{}/geocode/search", self.base_url))
            .timeout(Duration::from_secs(10))
            .header("Authorization", &self.api_key)
            .query(&[("text", address), ("size", "1")]);
        let response: Option<GeocodeResponse> = http::fetch_json(ROUTE_SERVICE, request).await?;
        Ok(response.and_then(|r| first_point(r, address)))
    }

    async fn directions(
        &self,
        profile: &str,
        from: &RoutePoint,
        to: &RoutePoint,
    ) -> Result<Option<RouteSummary>, ToolError> {
        let body = json!({
            "coordinates": [[from.lon, from.lat], [to.lon, to.lat]],
            "format": "json",
            "instructions": true,
            "units": "m",
        });
        let request = self
            .client
            .post(format!("{}/v2/directions/{}", self.base_url, profile))
            .header("Authorization", &self.api_key)
            .json(&body);
        let response: Option<DirectionsResponse> = http::fetch_json(ROUTE_SERVICE, request).await?;
        Ok(response.and_then(first_route))
    }
}

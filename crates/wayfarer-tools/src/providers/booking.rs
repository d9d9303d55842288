//! Hotel availability via the RapidAPI Booking.com endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{ToolError, BOOKING_SERVICE};
use crate::http;
use crate::providers::{LodgingQuery, LodgingSource};

#[derive(Debug, Clone)]
pub struct RapidApiBooking {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    host: String,
}

impl RapidApiBooking {
    pub fn new(
        base_url: &str,
        api_key: String,
        host: String,
        user_agent: &str,
    ) -> Result<Self, ToolError> {
        Ok(Self {
            client: http::build_client(BOOKING_SERVICE, Duration::from_secs(15), user_agent)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            host,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    data: Option<SearchData>,
}

#[derive(Debug, Deserialize)]
struct SearchData {
    #[serde(default)]
    hotels: Vec<serde_json::Value>,
}

fn query_params(query: &LodgingQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("dest_type", "city".to_string()),
        ("dest_id", query.location.clone()),
        ("search_type", "CITY".to_string()),
        ("arrival_date", query.checkin.format("%Y-%m-%d").to_string()),
        ("departure_date", query.checkout.format("%Y-%m-%d").to_string()),
        ("adults", "2".to_string()),
        ("room_qty", "1".to_string()),
        ("languagecode", "en-us".to_string()),
        ("currency_code", "INR".to_string()),
    ];
    if let Some((min, max)) = query.price_range {
        params.push(("price_min", min.to_string()));
        params.push(("price_max", max.to_string()));
    }
    params
}

#[async_trait]
impl LodgingSource for RapidApiBooking {
    async fn search(&self, query: &LodgingQuery) -> Result<Option<usize>, ToolError> {
        let request = self
            .client
            .get(format!("{}/api/v1/hotels/searchHotels", self.base_url))
            .header("X-RapidAPI-Key", &self.api_key)
            .header("X-RapidAPI-Host", &self.host)
            .query(&query_params(query));
        let response: Option<SearchResponse> = http::fetch_json(BOOKING_SERVICE, request).await?;
        Ok(response.map(|r| r.data.map(|d| d.hotels.len()).unwrap_or(0)))
    }
}

//! OpenWeatherMap current-conditions client.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{ToolError, WEATHER_SERVICE};
use crate::http;
use crate::providers::{WeatherReport, WeatherSource};

#[derive(Debug, Clone)]
pub struct OpenWeather {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl OpenWeather {
    pub fn new(url: &str, api_key: String, user_agent: &str) -> Result<Self, ToolError> {
        Ok(Self {
            client: http::build_client(WEATHER_SERVICE, Duration::from_secs(10), user_agent)?,
            url: url.to_string(),
            api_key,
        })
    }
}

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    name: String,
    sys: SysBlock,
    main: MainBlock,
    #[serde(default)]
    weather: Vec<ConditionBlock>,
    #[serde(default)]
    wind: Option<WindBlock>,
}

#[derive(Debug, Deserialize)]
struct SysBlock {
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: f64,
    feels_like: f64,
    humidity: u32,
}

#[derive(Debug, Deserialize)]
struct ConditionBlock {
    description: String,
}

#[derive(Debug, Deserialize)]
struct WindBlock {
    #[serde(default)]
    speed: f64,
}

impl From<WeatherResponse> for WeatherReport {
    fn from(r: WeatherResponse) -> Self {
        WeatherReport {
            city: r.name,
            country: r.sys.country,
            temp_c: r.main.temp,
            feels_like_c: r.main.feels_like,
            description: r
                .weather
                .into_iter()
                .next()
                .map(|w| w.description)
                .unwrap_or_default(),
            humidity: r.main.humidity,
            wind_speed: r.wind.map(|w| w.speed).unwrap_or(0.0),
        }
    }
}

#[async_trait]
impl WeatherSource for OpenWeather {
    async fn current(&self, location: &str) -> Result<Option<WeatherReport>, ToolError> {
        let request = self.client.get(&self.url).query(&[
            ("q", location),
            ("appid", self.api_key.as_str()),
            ("units", "metric"),
        ]);
        let response: Option<WeatherResponse> = http::fetch_json(WEATHER_SERVICE, request).await?;
        Ok(response.map(WeatherReport::from))
    }
}

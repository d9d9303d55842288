//! Unsplash photo search.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::{ToolError, IMAGE_SERVICE};
use crate::http;
use crate::providers::{ImageSource, Photo};

#[derive(Debug, Clone)]
pub struct Unsplash {
    client: reqwest::Client,
    base_url: String,
    access_key: String,
}

impl Unsplash {
    pub fn new(base_url: &str, access_key: String, user_agent: &str) -> Result<Self, ToolError> {
        Ok(Self {
            client: http::build_client(IMAGE_SERVICE, Duration::from_secs(15), user_agent)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_key,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<PhotoItem>,
}

#[derive(Debug, Deserialize)]
struct PhotoItem {
    alt_description: Option<String>,
    user: Option<UserItem>,
    urls: UrlsItem,
}

#[derive(Debug, Deserialize)]
struct UserItem {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UrlsItem {
    regular: String,
}

impl From<PhotoItem> for Photo {
    fn from(item: PhotoItem) -> Self {
        Photo {
            description: item.alt_description,
            photographer: item
                .user
                .and_then(|u| u.name)
                .unwrap_or_else(|| "Unknown".to_string()),
            url: item.urls.regular,
        }
    }
}

#[async_trait]
impl ImageSource for Unsplash {
    async fn search(&self, query: &str, per_page: usize) -> Result<Vec<Photo>, ToolError> {
        let per_page = per_page.to_string();
        let response = self
            .client
            .get(format!("{}/search/photos", self.base_url))
            .header("Authorization", format!("Client-ID {}", self.access_key))
            .header("Accept-Version", "v1")
            .query(&[
                ("query", query),
                ("per_page", per_page.as_str()),
                ("order_by", "relevant"),
                ("orientation", "landscape"),
            ])
            .send()
            .await
            .map_err(|e| http::transport_error(IMAGE_SERVICE, e))?;

        // Unsplash signals an exhausted hourly quota with 403.
        match response.status() {
            StatusCode::FORBIDDEN => return Err(ToolError::RateLimited(IMAGE_SERVICE)),
            s if !s.is_success() => return Err(http::status_error(IMAGE_SERVICE, s)),
            _ => {}
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| http::transport_error(IMAGE_SERVICE, e))?;
        Ok(body.results.into_iter().map(Photo::from).collect())
    }
}

//! NewsAPI "everything" search.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::{ToolError, NEWS_SERVICE};
use crate::http;
use crate::providers::{Article, NewsSource};

#[derive(Debug, Clone)]
pub struct NewsApi {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl NewsApi {
    pub fn new(url: &str, api_key: String, user_agent: &str) -> Result<Self, ToolError> {
        Ok(Self {
            client: http::build_client(NEWS_SERVICE, Duration::from_secs(30), user_agent)?,
            url: url.to_string(),
            api_key,
        })
    }
}

#[derive(Debug, Deserialize)]
struct NewsResponse {
    #[serde(default)]
    articles: Vec<ArticleItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArticleItem {
    title: Option<String>,
    description: Option<String>,
    source: Option<SourceItem>,
    published_at: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SourceItem {
    name: Option<String>,
}

impl From<ArticleItem> for Article {
    fn from(item: ArticleItem) -> Self {
        Article {
            title: item.title.unwrap_or_else(|| "No title".to_string()),
            description: item.description,
            source: item
                .source
                .and_then(|s| s.name)
                .unwrap_or_else(|| "Unknown".to_string()),
            published_at: item.published_at,
            url: item.url.unwrap_or_default(),
        }
    }
}

#[async_trait]
impl NewsSource for NewsApi {
    async fn search(&self, query: &str, from: NaiveDate) -> Result<Vec<Article>, ToolError> {
        let from = from.format("%Y-%m-%d").to_string();
        let request = self
            .client
            .get(&self.url)
            .header("X-API-Key", &self.api_key)
            .query(&[
                ("q", query),
                ("from", from.as_str()),
                ("sortBy", "publishedAt"),
                ("language", "en"),
                ("pageSize", "20"),
            ]);
        let response: Option<NewsResponse> = http::fetch_json(NEWS_SERVICE, request).await?;
        Ok(response
            .map(|r| r.articles.into_iter().map(Article::from).collect())
            .unwrap_or_default())
    }
}

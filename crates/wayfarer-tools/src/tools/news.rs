//! Recent travel news for a destination.

use chrono::{DateTime, Duration, NaiveDate};
use wayfarer_core::location::title_case;
use wayfarer_core::LocationNormalizer;

use crate::error::{ToolError, NEWS_SERVICE};
use crate::providers::{Article, NewsSource};
use crate::tools::{annotate, required, truncate};

const LOOKBACK_DAYS: i64 = 30;
const MAX_SHOWN: usize = 6;

fn travel_query(location: &str) -> String {
    format!(
        "{} AND (travel OR tourism OR tourist OR hotel OR attraction OR festival OR destination)",
        location
    )
}

/// Marker chosen from keywords in the title.
pub fn category_marker(title: &str) -> &'static str {
    let lower = title.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));
    if has(&["hotel", "resort"]) {
        "🏨"
    } else if has(&["temple", "heritage", "festival"]) {
        "🏛️"
    } else if has(&["food", "restaurant"]) {
        "🍛"
    } else if has(&["airport", "flight"]) {
        "✈️"
    } else {
        "📰"
    }
}

fn short_date(published_at: Option<&str>) -> String {
    published_at
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|dt| dt.format("%b %d").to_string())
        .unwrap_or_else(|| "Recent".to_string())
}

/// Articles mentioning the location, or the first few when none do.
pub fn relevant_articles<'a>(location: &str, articles: &'a [Article]) -> Vec<&'a Article> {
    let needle = location.to_lowercase();
    let mentions = |a: &Article| {
        a.title.to_lowercase().contains(&needle)
            || a
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle))
    };
    let matching: Vec<&Article> = articles.iter().filter(|a| mentions(a)).collect();
    if matching.is_empty() {
        articles.iter().take(MAX_SHOWN).collect()
    } else {
        matching.into_iter().take(MAX_SHOWN).collect()
    }
}

pub fn format_articles(location: &str, articles: &[&Article]) -> String {
    let mut text = format!("📰 Latest News for {}:\n\n", title_case(location));
    for article in articles {
        text.push_str(&format!(
            "{} {}\n   📅 {} | 🏢 {}\n   🔗 {}\n\n",
            category_marker(&article.title),
            truncate(&article.title, 80),
            short_date(article.published_at.as_deref()),
            article.source,
            article.url
        ));
    }
    text.push_str(&format!(
        "💡 Stay updated with the latest happenings in {}!",
        location
    ));
    text
}

pub async fn run(
    source: Option<&dyn NewsSource>,
    normalizer: &LocationNormalizer,
    location: &str,
    today: NaiveDate,
) -> Result<String, ToolError> {
    let location = required(location, "Please provide a destination for news.")?;
    let resolution = normalizer.normalize(location);
    let source = source.ok_or(ToolError::NotConfigured(NEWS_SERVICE))?;
    let name = resolution.resolved_name.as_str();
    let from = today - Duration::days(LOOKBACK_DAYS);

    let mut articles = source.search(&travel_query(name), from).await?;
    if articles.is_empty() {
        articles = source.search(&format!("{} travel", name), from).await?;
    }
    if articles.is_empty() {
        return Err(ToolError::NotFound(format!(
            "No recent news found for {}. Try checking local tourism websites.",
            name
        )));
    }

    let selected = relevant_articles(name, &articles);
    Ok(annotate(
        &resolution,
        format_articles(name, &selected),
        |n| format!("🔍 Did you mean '{}'? Let me get news anyway.\n\n", n),
        |n| format!("📍 News about {}:\n\n", n),
    ))
}

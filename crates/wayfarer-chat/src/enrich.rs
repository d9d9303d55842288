//! Best-effort tool calls added at synthesis time.
//!
//! Nothing here can fail a turn: every lookup yields an `Option`, and an
//! absent value is simply left out of the synthesis prompt.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use tracing::debug;

use wayfarer_core::location::{title_case, DEFAULT_CORRECTION_THRESHOLD};
use wayfarer_core::Gazetteer;
use wayfarer_tools::tools::budget::{format_inr, MID_RANGE};
use wayfarer_tools::tools::{imagery, landmarks, news, places};
use wayfarer_tools::{ToolError, ToolRegistry};

use crate::intent::Intent;

/// Places whose images are fetched individually.
pub const MAX_PLACE_IMAGES: usize = 5;

const DEFAULT_TRIP_DAYS: u32 = 3;

const PREPOSITIONS: [&str; 4] = ["in", "to", "at", "around"];

/// Words never taken as a destination by the first-long-word fallback.
const STOP_WORDS: [&str; 11] = [
    "plan", "trip", "days", "visit", "travel", "tour", "with", "family", "friends", "budget", "for",
];

static PLACE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"📍 \*\*([^*]+)\*\*").expect("valid place name regex"));
static TRIP_DAYS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*days?").expect("valid trip length regex"));

/// One extra tool result, rendered as `{label}: {text}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrichment {
    pub label: String,
    pub text: String,
}

impl Enrichment {
    fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }

    pub fn render(&self) -> String {
        format!("{}: {}", self.label, self.text)
    }
}

/// Destination named in a free-text query.
///
/// Known destinations named verbatim are matched first; then the words after
/// a locating preposition ("to Kerala", "in Ooty"); then the first word
/// longer than three letters that is not a planning word. A guessed word is
/// swapped for a known destination only at the silent-correction score.
pub fn extract_destination(query: &str, gazetteer: &Gazetteer) -> Option<String> {
    if let Some(found) = gazetteer.find_in_text(query) {
        return Some(found);
    }

    let words: Vec<&str> = query
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| matches!(c, '.' | ',' | '!' | '?')))
        .filter(|w| !w.is_empty())
        .collect();
    let is_stop = |w: &str| {
        let lower = w.to_lowercase();
        STOP_WORDS.contains(&lower.as_str()) || PREPOSITIONS.contains(&lower.as_str())
    };

    if let Some(at) = words
        .iter()
        .rposition(|w| PREPOSITIONS.contains(&w.to_lowercase().as_str()))
    {
        let candidate = words[at + 1..]
            .iter()
            .take(2)
            .take_while(|w| !is_stop(w) && w.chars().all(char::is_alphabetic))
            .copied()
            .collect::<Vec<_>>()
            .join(" ");
        if candidate.chars().count() > 3 {
            return Some(
                gazetteer
                    .closest(&candidate, DEFAULT_CORRECTION_THRESHOLD)
                    .unwrap_or_else(|| title_case(&candidate)),
            );
        }
    }

    words
        .into_iter()
        .find(|w| w.chars().count() > 3 && !STOP_WORDS.contains(&w.to_lowercase().as_str()))
        .map(|w| {
            gazetteer
                .closest(w, DEFAULT_CORRECTION_THRESHOLD)
                .unwrap_or_else(|| w.to_string())
        })
}

/// Names of the listed places in a places result, first few only.
pub fn place_names(places_text: &str) -> Vec<String> {
    PLACE_NAME
        .captures_iter(places_text)
        .map(|c| c[1].trim().to_string())
        .filter(|n| !n.is_empty())
        .take(MAX_PLACE_IMAGES)
        .collect()
}

/// Trip length from "N day(s)", else three days.
pub fn trip_days(query: &str) -> u32 {
    TRIP_DAYS
        .captures(&query.to_lowercase())
        .and_then(|c| c[1].parse().ok())
        .filter(|d| *d > 0)
        .unwrap_or(DEFAULT_TRIP_DAYS)
}

/// Mid-range cost block for a trip of `days` days.
pub fn budget_block(destination: &str, days: u32) -> String {
    let per_day = MID_RANGE.total();
    format!(
        "💰 **Budget for {days}-day {dest} trip:**\n\n\
**Mid-range Category:**\n\
🏨 Accommodation: {acc} per day\n\
🍛 Food: {food} per day\n\
🚗 Transport: {transport} per day\n\
🎫 Activities: {activities} per day\n\n\
**Total per day: {per_day}**\n\
**{days}-day trip total: {total}**",
        days = days,
        dest = destination,
        acc = format_inr(i64::from(MID_RANGE.accommodation)),
        food = format_inr(i64::from(MID_RANGE.food)),
        transport = format_inr(i64::from(MID_RANGE.transport)),
        activities = format_inr(i64::from(MID_RANGE.activities)),
        per_day = format_inr(i64::from(per_day)),
        total = format_inr(i64::from(per_day) * i64::from(days)),
    )
}

fn keep(label: &str, result: Result<String, ToolError>) -> Option<String> {
    match result {
        Ok(text) => Some(text),
        Err(e) => {
            debug!(enrichment = label, error = %e, "Enrichment skipped");
            None
        }
    }
}

/// Runs the enrichment lookups against the registry's providers.
pub struct Enricher<'a> {
    registry: &'a ToolRegistry,
    today: NaiveDate,
}

impl<'a> Enricher<'a> {
    pub fn new(registry: &'a ToolRegistry, today: NaiveDate) -> Self {
        Self { registry, today }
    }

    pub async fn enrich(&self, intent: Intent, query: &str) -> Vec<Enrichment> {
        if !intent.enriches_places() {
            return Vec::new();
        }
        let Some(destination) =
            extract_destination(query, self.registry.normalizer().gazetteer())
        else {
            return Vec::new();
        };
        debug!(%intent, destination = %destination, "Enriching tool results");

        let mut extra = Vec::new();
        match self.places(&destination).await {
            Some(listing) => {
                let names = place_names(&listing);
                extra.push(Enrichment::new("PlacesTool", listing));
                for name in names {
                    if let Some(images) = self.images(&name).await {
                        extra.push(Enrichment::new(format!("ImagesTool({})", name), images));
                    }
                }
            }
            None => {
                if let Some(images) = self.images(&destination).await {
                    extra.push(Enrichment::new("ImagesTool", images));
                }
            }
        }

        if intent == Intent::TripPlanning {
            let waterfall = landmarks::safest_waterfall(&destination);
            extra.push(Enrichment::new(
                "SafestWaterfall",
                landmarks::format_safety(waterfall),
            ));
            if let Some(images) = self.images(waterfall.name).await {
                extra.push(Enrichment::new(
                    format!("ImagesTool({})", waterfall.name),
                    images,
                ));
            }
            if let Some(news) = self.news(&destination).await {
                extra.push(Enrichment::new("NewsTool", news));
            }
            if query.to_lowercase().contains("budget") {
                extra.push(Enrichment::new(
                    "BudgetTool",
                    budget_block(&destination, trip_days(query)),
                ));
            }
        }
        extra
    }

    async fn places(&self, destination: &str) -> Option<String> {
        let p = self.registry.providers();
        let result = places::run(
            p.geocoder.as_deref(),
            p.features.as_deref(),
            self.registry.normalizer(),
            destination,
            "tourism",
        )
        .await;
        keep("places", result)
    }

    async fn images(&self, subject: &str) -> Option<String> {
        let p = self.registry.providers();
        let result = imagery::run(p.images.as_deref(), self.registry.normalizer(), subject).await;
        keep("images", result)
    }

    async fn news(&self, destination: &str) -> Option<String> {
        let p = self.registry.providers();
        let result = news::run(
            p.news.as_deref(),
            self.registry.normalizer(),
            destination,
            self.today,
        )
        .await;
        keep("news", result)
    }
}

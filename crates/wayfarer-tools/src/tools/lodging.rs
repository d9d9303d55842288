//! Lodging search with a two-step fill-in and a booking-link fallback.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use wayfarer_core::location::title_case;
use wayfarer_core::LocationNormalizer;

use crate::error::{ToolError, BOOKING_SERVICE};
use crate::providers::{LodgingQuery, LodgingSource};
use crate::tools::annotate;

pub const DESTINATION_PROMPT: &str = "🏨 **Welcome to Hotel Booking Assistant!**\n\n\
    Please tell me your destination (e.g., 'Goa', 'Kerala', 'Manali'):";

/// Price band for a lodging search, in INR per night.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BudgetTier {
    Budget,
    Average,
    Rich,
    Luxury,
    #[default]
    All,
}

impl BudgetTier {
    /// `None` for [`BudgetTier::All`]: no price filter is sent.
    pub fn price_range(&self) -> Option<(u32, u32)> {
        match self {
            BudgetTier::Budget => Some((0, 3000)),
            BudgetTier::Average => Some((3000, 8000)),
            BudgetTier::Rich => Some((8000, 20000)),
            BudgetTier::Luxury => Some((20000, 100000)),
            BudgetTier::All => None,
        }
    }
}

impl fmt::Display for BudgetTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BudgetTier::Budget => write!(f, "budget"),
            BudgetTier::Average => write!(f, "average"),
            BudgetTier::Rich => write!(f, "rich"),
            BudgetTier::Luxury => write!(f, "luxury"),
            BudgetTier::All => write!(f, "all"),
        }
    }
}

impl FromStr for BudgetTier {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "budget" => Ok(BudgetTier::Budget),
            "average" => Ok(BudgetTier::Average),
            "rich" => Ok(BudgetTier::Rich),
            "luxury" => Ok(BudgetTier::Luxury),
            "" | "all" => Ok(BudgetTier::All),
            _ => Err(format!("Unknown budget tier: {}", s)),
        }
    }
}

/// Default stay: one night, a week from `today`.
pub fn stay_dates(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (today + Duration::days(7), today + Duration::days(8))
}

pub fn lodging_type_prompt(location: &str) -> String {
    format!(
        "📍 **Destination:** {}\n\n\
         🏨 **What type of accommodation are you looking for?**\n\n\
         • **Hotel** - Standard hotels with modern amenities\n\
         • **Resort** - Luxury resorts with recreational facilities\n\
         • **Cottage** - Cozy cottages and homestays\n\
         • **Villa** - Private villas and vacation homes\n\n\
         Please specify: hotel, resort, cottage, or villa",
        title_case(location)
    )
}

/// Booking.com search URL for the same stay.
pub fn booking_link(location: &str, lodging_type: &str, query: &LodgingQuery) -> String {
    let price = query
        .price_range
        .map(|(min, max)| format!("&price=INR-{}-{}", min, max))
        .unwrap_or_default();
    format!(
        "https://www.booking.com/searchresults.html?ss={}+in+{}&checkin={}&checkout={}\
         &group_adults=2&no_rooms=1&selected_currency=INR{}",
        lodging_type,
        location.replace(' ', "+"),
        query.checkin.format("%Y-%m-%d"),
        query.checkout.format("%Y-%m-%d"),
        price
    )
}

fn fallback_text(
    status: &str,
    location: &str,
    lodging_type: &str,
    tier: BudgetTier,
    query: &LodgingQuery,
) -> String {
    let kind = title_case(lodging_type);
    let place = title_case(location);
    let mut text = format!(
        "🏨 **{}s in {}**\n\n{} - Search directly on Booking.com:\n\n📅 **Dates:** {} to {}\n\n",
        kind,
        place,
        status,
        query.checkin.format("%Y-%m-%d"),
        query.checkout.format("%Y-%m-%d")
    );
    if tier != BudgetTier::All {
        text.push_str(&format!(
            "💰 **Budget Filter:** {} range applied\n\n",
            title_case(&tier.to_string())
        ));
    }
    text.push_str(&format!(
        "📍 **Search {}s in {}**\n🔗 [Book Here]({})\n\n\
         💡 **Tip:** Search for '{} in {}' on Booking.com\n\
         🇮🇳 **For Indian Travelers:** All prices in INR with best deals!",
        kind,
        place,
        booking_link(location, lodging_type, query),
        lodging_type,
        location.to_lowercase()
    ));
    text
}

pub async fn run(
    source: Option<&dyn LodgingSource>,
    normalizer: &LocationNormalizer,
    location: &str,
    lodging_type: &str,
    budget: &str,
    today: NaiveDate,
) -> Result<String, ToolError> {
    let location = location.trim();
    if location.is_empty() {
        return Ok(DESTINATION_PROMPT.to_string());
    }
    let resolution = normalizer.normalize(location);
    let place = resolution.resolved_name.as_str();
    let lodging_type = lodging_type.trim().to_lowercase();

    let confirm = |n: &str| {
        format!(
            "🔍 Did you mean '{}' (you wrote '{}')? Let me find {}s there anyway.\n\n",
            n, location, lodging_type
        )
    };
    let auto = |n: &str| format!("📍 Finding {}s in {}:\n\n", lodging_type, n);

    if lodging_type.is_empty() {
        return Ok(annotate(&resolution, lodging_type_prompt(place), confirm, auto));
    }

    let tier: BudgetTier = budget.parse().unwrap_or_else(|_| {
        tracing::debug!(budget, "Unrecognised budget tier, searching all prices");
        BudgetTier::All
    });
    let (checkin, checkout) = stay_dates(today);
    let query = LodgingQuery {
        location: place.to_string(),
        checkin,
        checkout,
        price_range: tier.price_range(),
    };

    let Some(source) = source else {
        return Err(ToolError::Fallback {
            cause: Box::new(ToolError::NotConfigured(BOOKING_SERVICE)),
            fallback: fallback_text(
                "❌ **API credentials not configured**",
                place,
                &lodging_type,
                tier,
                &query,
            ),
        });
    };

    let count = match source.search(&query).await {
        Ok(Some(n)) if n > 0 => n,
        Ok(Some(_)) => {
            return Err(ToolError::NotFound(format!(
                "No hotels found for '{}' via API.",
                place
            )))
        }
        Ok(None) => {
            return Err(ToolError::NotFound(format!(
                "Location '{}' not found via API.",
                place
            )))
        }
        Err(e) => {
            return Err(ToolError::Fallback {
                cause: Box::new(e),
                fallback: fallback_text(
                    "❌ **API temporarily unavailable**",
                    place,
                    &lodging_type,
                    tier,
                    &query,
                ),
            })
        }
    };

    let budget_info = match tier {
        BudgetTier::All => String::new(),
        t => format!(" (Budget: {})", title_case(&t.to_string())),
    };
    let body = format!(
        "✅ Found {} {}s in {}{}!",
        count,
        title_case(&lodging_type),
        title_case(place),
        budget_info
    );
    Ok(annotate(&resolution, body, confirm, auto))
}

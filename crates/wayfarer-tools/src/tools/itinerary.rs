//! Day-by-day itinerary template.

use wayfarer_core::location::title_case;
use wayfarer_core::LocationNormalizer;

use crate::tools::annotate;

/// Days spelled out individually; the rest are summarised.
const DETAILED_DAYS: u32 = 3;

fn activities(destination: &str) -> [&'static str; 3] {
    match destination.trim().to_lowercase().as_str() {
        "goa" => [
            "Beach hopping & water sports",
            "Old Goa churches & heritage",
            "Night markets & local cuisine",
        ],
        "kerala" => [
            "Kochi & Chinese nets",
            "Munnar tea gardens",
            "Alleppey backwaters",
        ],
        "rajasthan" => [
            "City Palace & Hawa Mahal",
            "Amber Fort & local markets",
            "Cultural shows & cuisine",
        ],
        "himachal pradesh" => [
            "Local sightseeing & temples",
            "Adventure activities",
            "Mountain views & photography",
        ],
        _ => ["Local sightseeing", "Cultural exploration", "Relaxation"],
    }
}

pub fn format_itinerary(destination: &str, days: u32) -> String {
    let mut text = format!(
        "📋 **{}-Day Itinerary for {}**\n\n",
        days,
        title_case(destination)
    );
    for (day, activity) in (1..=days.min(DETAILED_DAYS)).zip(activities(destination)) {
        text.push_str(&format!("**Day {}:** {}\n", day, activity));
    }
    if days > DETAILED_DAYS {
        text.push_str(&format!(
            "**Days 4-{}:** Continue exploring based on personal interests\n",
            days
        ));
    }
    text.push_str(
        "\n🎒 **Essentials:** Comfortable shoes, camera, local currency\n\
         📱 **Helpful Apps:** Google Maps, Zomato, MakeMyTrip\n\
         💡 **Tips:** Learn basic local greetings, try authentic food, respect local customs",
    );
    text
}

pub fn run(normalizer: &LocationNormalizer, destination: &str, days: u32) -> String {
    let resolution = normalizer.normalize(destination);
    annotate(
        &resolution,
        format_itinerary(&resolution.resolved_name, days),
        |n| format!("🔍 Did you mean '{}'? Here's the itinerary anyway:\n\n", n),
        |n| format!("📍 Itinerary for {} (auto-corrected):\n\n", n),
    )
}

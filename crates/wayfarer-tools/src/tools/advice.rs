//! Static travel tips and safety alerts.

use wayfarer_core::location::title_case;
use wayfarer_core::LocationNormalizer;

use crate::tools::annotate;

/// Best season and headline tip for a destination.
pub fn destination_tips(destination: &str) -> (&'static str, &'static str) {
    match destination.trim().to_lowercase().as_str() {
        "goa" => (
            "Nov-Mar",
            "Rent scooter for easy travel, try fresh seafood, respect beach rules",
        ),
        "kerala" => (
            "Oct-Mar",
            "Experience houseboat stays, try local cuisine, follow temple etiquette",
        ),
        "rajasthan" => (
            "Oct-Mar",
            "Stay hydrated, bargain in local markets, consider heritage hotels",
        ),
        "himachal pradesh" => (
            "Apr-Jun",
            "Carry warm clothes, book accommodations in advance, follow mountain safety",
        ),
        _ => ("Research climate", "Respect local culture and customs"),
    }
}

pub fn format_tips(destination: &str) -> String {
    let (best_time, tip) = destination_tips(destination);
    format!(
        "💡 **Travel Tips for {}**\n\n\
         🌟 **Best Time to Visit:** {}\n\
         🎯 **Key Tips:** {}\n\n\
         💰 **Money Matters:** Carry cash, use UPI for payments, notify banks about travel\n\
         📱 **Communication:** Get local SIM, download offline maps, save emergency numbers\n\
         🏥 **Health & Safety:** Drink bottled water, carry basic medicines, get travel insurance\n\
         👗 **Dress Code:** Modest clothing for religious places, comfortable walking shoes, weather-appropriate clothing",
        title_case(destination),
        best_time,
        tip
    )
}

pub fn format_alerts(destination: &str) -> String {
    format!(
        "⚠️ **Travel Alerts for {}**\n\n\
         📞 **Emergency Numbers:**\n\
         🚔 Police: 100 | 🚑 Ambulance: 108 | 🗣️ Tourist Helpline: 1363\n\n\
         🔒 **Safety Guidelines:**\n\
         • Keep valuables secure and use hotel safes\n\
         • Use only registered transport services\n\
         • Avoid isolated areas, especially at night\n\
         • Share your itinerary with family/friends\n\n\
         🏥 **Health Precautions:** Use bottled water, carry personal medicines, maintain travel insurance\n\
         🌦️ **Weather Awareness:** Check local forecasts, carry appropriate clothing\n\
         📋 **Important Documents:** Keep copies of ID, tickets, and emergency contacts",
        title_case(destination)
    )
}

pub fn run_tips(normalizer: &LocationNormalizer, destination: &str) -> String {
    let resolution = normalizer.normalize(destination);
    annotate(
        &resolution,
        format_tips(&resolution.resolved_name),
        |n| format!("🔍 Did you mean '{}'? Here are the tips anyway:\n\n", n),
        |n| format!("📍 Tips for {} (auto-corrected):\n\n", n),
    )
}

pub fn run_alerts(normalizer: &LocationNormalizer, destination: &str) -> String {
    let resolution = normalizer.normalize(destination);
    annotate(
        &resolution,
        format_alerts(&resolution.resolved_name),
        |n| format!("🔍 Did you mean '{}'? Here are the alerts anyway:\n\n", n),
        |n| format!("📍 Alerts for {} (auto-corrected):\n\n", n),
    )
}

//! Daily cost estimate from static tables.

use wayfarer_core::location::title_case;
use wayfarer_core::LocationNormalizer;

use crate::tools::annotate;

/// Per-day costs in INR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyCosts {
    pub accommodation: u32,
    pub food: u32,
    pub transport: u32,
    pub activities: u32,
}

impl DailyCosts {
    pub fn total(&self) -> u32 {
        self.accommodation + self.food + self.transport + self.activities
    }
}

pub const MID_RANGE: DailyCosts = DailyCosts {
    accommodation: 2500,
    food: 1200,
    transport: 800,
    activities: 1000,
};

/// Base costs per traveller type; anything unknown is treated as "budget".
pub fn base_costs(traveler_type: &str) -> DailyCosts {
    match traveler_type.trim().to_lowercase().as_str() {
        "mid-range" => MID_RANGE,
        "luxury" => DailyCosts {
            accommodation: 8000,
            food: 3000,
            transport: 2000,
            activities: 2500,
        },
        _ => DailyCosts {
            accommodation: 800,
            food: 500,
            transport: 300,
            activities: 400,
        },
    }
}

/// Regional price adjustment relative to the base tables.
pub fn cost_multiplier(destination: &str) -> f64 {
    match destination.trim().to_lowercase().as_str() {
        "goa" => 1.2,
        "mumbai" => 1.5,
        "delhi" => 1.3,
        "kerala" => 1.1,
        "rajasthan" => 1.0,
        "himachal pradesh" => 1.3,
        "dubai" => 3.0,
        "singapore" => 2.8,
        "thailand" => 0.8,
        _ => 1.0,
    }
}

/// Rupee amount with thousands separators.
pub fn format_inr(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if amount < 0 {
        format!("₹-{}", grouped)
    } else {
        format!("₹{}", grouped)
    }
}

fn scaled(amount: u32, multiplier: f64) -> i64 {
    (f64::from(amount) * multiplier) as i64
}

pub fn format_budget(destination: &str, days: u32, traveler_type: &str) -> String {
    let costs = base_costs(traveler_type);
    let m = cost_multiplier(destination);
    let daily = f64::from(costs.total()) * m;
    let total = daily * f64::from(days);
    let tier = match traveler_type.trim() {
        "" => "Budget".to_string(),
        t => title_case(t),
    };

    format!(
        "💰 **Budget for {} ({} days)**\n\n\
         **{} Category:**\n\
         🏨 Accommodation: {} per day\n\
         🍛 Food: {} per day\n\
         🚗 Transport: {} per day\n\
         🎫 Activities: {} per day\n\n\
         **Total per day: {}**\n\
         **{}-day trip total: {}**\n\n\
         💡 **Indian Traveler Tips:**\n\
         • Book trains in advance for better prices\n\
         • Use local transport and street food to save money\n\
         • Look for government guest houses for budget stays\n\
         • Carry cash for better bargaining power",
        title_case(destination),
        days,
        tier,
        format_inr(scaled(costs.accommodation, m)),
        format_inr(scaled(costs.food, m)),
        format_inr(scaled(costs.transport, m)),
        format_inr(scaled(costs.activities, m)),
        format_inr(daily as i64),
        days,
        format_inr(total as i64),
    )
}

pub fn run(normalizer: &LocationNormalizer, destination: &str, days: u32, traveler_type: &str) -> String {
    let resolution = normalizer.normalize(destination);
    annotate(
        &resolution,
        format_budget(&resolution.resolved_name, days, traveler_type),
        |n| format!("🔍 Did you mean '{}'? Here's the budget anyway:\n\n", n),
        |n| format!("📍 Budget for {} (auto-corrected):\n\n", n),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_inr() {
        assert_eq!(format_inr(0), "₹0");
        assert_eq!(format_inr(960), "₹960");
        assert_eq!(format_inr(5500), "₹5,500");
        assert_eq!(format_inr(1234567), "₹1,234,567");
    }

    #[test]
    fn test_unknown_tier_is_budget() {
        assert_eq!(base_costs("backpacker"), base_costs("budget"));
        assert_eq!(base_costs("Mid-Range").total(), 5500);
    }

    #[test]
    fn test_mumbai_mid_range() {
        let text = format_budget("mumbai", 3, "mid-range");
        assert!(text.starts_with("💰 **Budget for Mumbai (3 days)**\n\n**Mid-range Category:**"));
        assert!(text.contains("🏨 Accommodation: ₹3,750 per day"));
        assert!(text.contains("🍛 Food: ₹1,800 per day"));
        assert!(text.contains("**Total per day: ₹8,250**"));
        assert!(text.contains("**3-day trip total: ₹24,750**"));
    }

    #[test]
    fn test_unknown_destination_uses_base_rates() {
        let text = format_budget("hampi", 2, "budget");
        assert!(text.contains("**Total per day: ₹2,000**"));
        assert!(text.contains("**2-day trip total: ₹4,000**"));
    }

    #[test]
    fn test_run_auto_correction_notice() {
        let text = run(&LocationNormalizer::default(), "mumbay", 1, "budget");
        assert!(text.starts_with("📍 Budget for Mumbai (auto-corrected):\n\n💰 **Budget for Mumbai"));
    }
}

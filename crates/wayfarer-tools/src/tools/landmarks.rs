//! Safest-known waterfall per region, used to ground trip planning.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SafetyLevel {
    Safe,
    Moderate,
}

impl std::fmt::Display for SafetyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SafetyLevel::Safe => write!(f, "SAFE"),
            SafetyLevel::Moderate => write!(f, "MODERATE"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Waterfall {
    pub name: &'static str,
    pub safety_level: SafetyLevel,
    pub current_status: &'static str,
    pub best_time: &'static str,
    pub bathing: &'static str,
}

const REGIONS: &[(&str, Waterfall)] = &[
    (
        "kerala",
        Waterfall {
            name: "Athirappilly Falls",
            safety_level: SafetyLevel::Safe,
            current_status: "Safe for viewing",
            best_time: "8:00 AM - 10:00 AM",
            bathing: "Shallow areas only",
        },
    ),
    (
        "tamil nadu",
        Waterfall {
            name: "Courtallam Falls",
            safety_level: SafetyLevel::Safe,
            current_status: "Excellent for families",
            best_time: "7:00 AM - 9:00 AM",
            bathing: "Multiple safe areas",
        },
    ),
    (
        "karnataka",
        Waterfall {
            name: "Jog Falls",
            safety_level: SafetyLevel::Safe,
            current_status: "Safe for viewing",
            best_time: "8:00 AM - 10:00 AM",
            bathing: "Viewing only",
        },
    ),
    (
        "goa",
        Waterfall {
            name: "Dudhsagar Falls",
            safety_level: SafetyLevel::Moderate,
            current_status: "Safe with precautions",
            best_time: "8:00 AM - 10:00 AM",
            bathing: "Exercise caution",
        },
    ),
];

static FALLBACK: Waterfall = Waterfall {
    name: "Local Safe Waterfall",
    safety_level: SafetyLevel::Safe,
    current_status: "Safe for viewing",
    best_time: "8:00 AM - 10:00 AM",
    bathing: "Check conditions",
};

/// First region whose name occurs in `location`, else a generic entry.
pub fn safest_waterfall(location: &str) -> &'static Waterfall {
    let lower = location.to_lowercase();
    REGIONS
        .iter()
        .find(|(region, _)| lower.contains(region))
        .map(|(_, waterfall)| waterfall)
        .unwrap_or(&FALLBACK)
}

pub fn format_safety(waterfall: &Waterfall) -> String {
    format!(
        "**{}** 🌊\n- Safety Status: {} - {}\n- Best Time: {}\n- Bathing: {}\n- Duration: 2-3 hours",
        waterfall.name,
        waterfall.safety_level,
        waterfall.current_status,
        waterfall.best_time,
        waterfall.bathing
    )
}

//! Current weather with a single travel advisory.

use wayfarer_core::location::title_case;
use wayfarer_core::LocationNormalizer;

use crate::error::{ToolError, WEATHER_SERVICE};
use crate::providers::{WeatherReport, WeatherSource};
use crate::tools::{annotate, required};

/// The advisory for the first matching rule, if any.
pub fn advisory(report: &WeatherReport) -> Option<&'static str> {
    if report.temp_c > 35.0 {
        Some("🔥 **Travel Tip:** Very hot! Carry water, wear sunscreen, avoid midday travel.")
    } else if report.temp_c < 10.0 {
        Some("🧥 **Travel Tip:** Cold weather! Pack warm clothes and layers.")
    } else if report.humidity > 80 {
        Some("💧 **Travel Tip:** High humidity! Light, breathable cotton clothing recommended.")
    } else if report.wind_speed > 10.0 {
        Some("💨 **Travel Tip:** Windy conditions! Secure loose items and be cautious outdoors.")
    } else {
        None
    }
}

pub fn format_report(report: &WeatherReport) -> String {
    let mut text = format!(
        "🌍 **Live Weather in {}, {}:**\n\n\
         🌡️ **Temperature:** {:.1}°C (Feels like {:.1}°C)\n\
         ☁️ **Condition:** {}\n\
         💧 **Humidity:** {}%\n\
         💨 **Wind Speed:** {} m/s",
        report.city,
        report.country,
        report.temp_c,
        report.feels_like_c,
        title_case(&report.description),
        report.humidity,
        report.wind_speed,
    );
    if let Some(tip) = advisory(report) {
        text.push('\n');
        text.push_str(tip);
    }
    text.push_str("\n\n🇮🇳 **For Indian Travelers:** Perfect weather data to plan your trip timing!");
    text
}

pub async fn run(
    source: Option<&dyn WeatherSource>,
    normalizer: &LocationNormalizer,
    location: &str,
) -> Result<String, ToolError> {
    let location = required(location, "Please provide a location to check the weather.")?;
    let resolution = normalizer.normalize(location);
    let source = source.ok_or(ToolError::NotConfigured(WEATHER_SERVICE))?;

    let report = source
        .current(&resolution.resolved_name)
        .await?
        .ok_or_else(|| {
            ToolError::NotFound(format!(
                "Location '{}' not found. Check spelling and try again.",
                resolution.resolved_name
            ))
        })?;

    Ok(annotate(
        &resolution,
        format_report(&report),
        |n| format!("🔍 Did you mean '{}'? Let me check weather there anyway.\n\n", n),
        |n| format!("📍 Showing weather for {}:\n\n", n),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn report(temp_c: f64, humidity: u32, wind_speed: f64) -> WeatherReport {
        WeatherReport {
            city: "Panaji".to_string(),
            country: "IN".to_string(),
            temp_c,
            feels_like_c: temp_c + 2.0,
            description: "clear sky".to_string(),
            humidity,
            wind_speed,
        }
    }

    struct FixedWeather {
        report: Option<WeatherReport>,
        queried: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl WeatherSource for FixedWeather {
        async fn current(&self, location: &str) -> Result<Option<WeatherReport>, ToolError> {
            self.queried.lock().unwrap().push(location.to_string());
            Ok(self.report.clone())
        }
    }

    fn fixed(report: Option<WeatherReport>) -> FixedWeather {
        FixedWeather {
            report,
            queried: Mutex::new(Vec::new()),
        }
    }

    // ---- Advisory rules ----

    #[test]
    fn test_heat_advisory_wins_over_humidity() {
        let tip = advisory(&report(38.0, 90, 12.0)).unwrap();
        assert!(tip.contains("Very hot"));
    }

    #[test]
    fn test_cold_advisory() {
        assert!(advisory(&report(5.0, 40, 2.0)).unwrap().contains("Cold weather"));
    }

    #[test]
    fn test_humidity_then_wind() {
        assert!(advisory(&report(28.0, 85, 12.0)).unwrap().contains("High humidity"));
        assert!(advisory(&report(28.0, 60, 12.0)).unwrap().contains("Windy"));
        assert!(advisory(&report(28.0, 60, 3.0)).is_none());
    }

    #[test]
    fn test_format_report() {
        let text = format_report(&report(36.4, 50, 3.5));
        assert!(text.starts_with("🌍 **Live Weather in Panaji, IN:**"));
        assert!(text.contains("🌡️ **Temperature:** 36.4°C (Feels like 38.4°C)"));
        assert!(text.contains("☁️ **Condition:** Clear Sky"));
        assert!(text.contains("💨 **Wind Speed:** 3.5 m/s\n🔥 **Travel Tip:**"));
        assert!(text.ends_with("plan your trip timing!"));
    }

    // ---- Run ----

    #[tokio::test]
    async fn test_run_exact_gazetteer_hit_has_no_notice() {
        let source = fixed(Some(report(30.0, 50, 2.0)));
        let text = run(Some(&source), &LocationNormalizer::default(), "goa")
            .await
            .unwrap();
        assert!(text.starts_with("🌍"));
        assert_eq!(source.queried.lock().unwrap().as_slice(), ["Goa"]);
    }

    #[tokio::test]
    async fn test_run_auto_corrected_notice() {
        let source = fixed(Some(report(30.0, 50, 2.0)));
        let text = run(Some(&source), &LocationNormalizer::default(), "keralaa")
            .await
            .unwrap();
        assert!(text.starts_with("📍 Showing weather for Kerala:\n\n🌍"));
        assert_eq!(source.queried.lock().unwrap().as_slice(), ["Kerala"]);
    }

    #[tokio::test]
    async fn test_run_not_configured() {
        let err = run(None, &LocationNormalizer::default(), "Goa").await.unwrap_err();
        assert!(matches!(err, ToolError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn test_run_unknown_location() {
        let source = fixed(None);
        let err = run(Some(&source), &LocationNormalizer::default(), "Xyzzyq")
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Location 'Xyzzyq' not found. Check spelling and try again."
        );
    }

    #[tokio::test]
    async fn test_run_empty_location() {
        let err = run(None, &LocationNormalizer::default(), "  ").await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}

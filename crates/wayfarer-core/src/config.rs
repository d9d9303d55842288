use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, WayfarerError};

/// Top-level configuration for the Wayfarer application.
///
/// Loaded from `~/.wayfarer/config.toml` by default, then overlaid with
/// credentials from the environment. Each section corresponds to one
/// bounded context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WayfarerConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub services: ServicesConfig,
    #[serde(default)]
    pub sos: SosConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

impl WayfarerConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: WayfarerConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| WayfarerError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Overlay credentials from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Overlay credentials from an arbitrary lookup. Empty values are ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("GROQ_API_KEY") {
            self.llm.api_key = Some(v);
        }
        if let Some(v) = get("OPENWEATHER_API_KEY") {
            self.services.openweather_api_key = Some(v);
        }
        if let Some(v) = get("OPENROUTESERVICE_API_KEY") {
            self.services.openrouteservice_api_key = Some(v);
        }
        if let Some(v) = get("UNSPLASH_ACCESS_KEY") {
            self.services.unsplash_access_key = Some(v);
        }
        if let Some(v) = get("NEWS_API_KEY") {
            self.services.news_api_key = Some(v);
        }
        if let Some(v) = get("RAPIDAPI_KEY") {
            self.services.rapidapi_key = Some(v);
        }
        if let Some(v) = get("RAPIDAPI_HOST") {
            self.services.rapidapi_host = Some(v);
        }
        if let Some(v) = get("RAPIDAPI_BASE_URL") {
            self.services.rapidapi_base_url = Some(v);
        }
        if let Some(v) = get("SOS_WEBHOOK_URL") {
            self.sos.webhook_url = Some(v);
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory for the SQLite database and the local contact file.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// HTTP/WebSocket server port.
    pub port: u16,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.wayfarer/data".to_string(),
            log_level: "info".to_string(),
            port: 7860,
        }
    }
}

/// Language model endpoint (any OpenAI-compatible chat completions API).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            api_key: None,
            model: "llama-3.1-8b-instant".to_string(),
            temperature: 0.3,
            timeout_secs: 60,
        }
    }
}

/// Credentials and endpoints of the external data providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    /// User-Agent sent to OpenStreetMap services (required by their usage policy).
    pub user_agent: String,
    pub openweather_api_key: Option<String>,
    pub openrouteservice_api_key: Option<String>,
    pub unsplash_access_key: Option<String>,
    pub news_api_key: Option<String>,
    pub rapidapi_key: Option<String>,
    pub rapidapi_host: Option<String>,
    pub rapidapi_base_url: Option<String>,
    pub openweather_url: String,
    pub nominatim_url: String,
    pub overpass_url: String,
    pub openrouteservice_url: String,
    pub unsplash_url: String,
    pub newsapi_url: String,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            user_agent: "IndianTravelApp/1.0".to_string(),
            openweather_api_key: None,
            openrouteservice_api_key: None,
            unsplash_access_key: None,
            news_api_key: None,
            rapidapi_key: None,
            rapidapi_host: None,
            rapidapi_base_url: None,
            openweather_url: "https://api.openweathermap.org/data/2.5/weather".to_string(),
            nominatim_url: "https://nominatim.openstreetmap.org".to_string(),
            overpass_url: "https://overpass-api.de/api/interpreter".to_string(),
            openrouteservice_url: "https://api.openrouteservice.org".to_string(),
            unsplash_url: "https://api.unsplash.com".to_string(),
            newsapi_url: "https://newsapi.org/v2".to_string(),
        }
    }
}

/// Emergency alert configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SosConfig {
    /// Local fallback contact list, relative to the data directory unless absolute.
    pub contacts_file: String,
    /// Pause between two outbound alert messages.
    pub send_delay_ms: u64,
    /// Outbound alert webhook. Alerts are simulated and logged when unset.
    pub webhook_url: Option<String>,
}

impl Default for SosConfig {
    fn default() -> Self {
        Self {
            contacts_file: "emergency_contacts.json".to_string(),
            send_delay_ms: 2000,
            webhook_url: None,
        }
    }
}

/// Conversation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Maximum accepted length of one user message, in characters.
    pub max_message_length: usize,
    /// Similarity at or above which a location is auto-corrected.
    pub correction_threshold: f64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_message_length: 2000,
            correction_threshold: 0.8,
        }
    }
}

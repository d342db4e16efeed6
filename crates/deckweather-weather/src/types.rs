use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Icon codes published by the OpenWeather API. Only these have artwork.
pub const KNOWN_ICONS: [&str; 18] = [
    "01d", "01n", "02d", "02n", "03d", "03n", "04d", "04n", "09d", "09n", "10d", "10n", "11d",
    "11n", "13d", "13n", "50d", "50n",
];

/// Whether `code` is one of [`KNOWN_ICONS`].
pub fn is_known_icon(code: &str) -> bool {
    KNOWN_ICONS.contains(&code)
}

/// Current conditions as returned by one fetch. Never cached.
///
/// Every reading is optional: the provider omits fields it has no value for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

impl WeatherSnapshot {
    /// Snapshot with the three displayed readings and an icon, stamped now.
    pub fn new(
        temperature: Option<f64>,
        humidity: Option<f64>,
        wind_speed: Option<f64>,
        icon: Option<&str>,
    ) -> Self {
        Self {
            temperature,
            humidity,
            wind_speed,
            description: None,
            icon: icon.map(str::to_string),
            fetched_at: Utc::now(),
        }
    }
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Missing setting: {0}")]
    MissingSetting(&'static str),
    #[error("Invalid API key")]
    InvalidApiKey,
    #[error("Location not found: {0}")]
    LocationNotFound(String),
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),
    #[error("Weather API error: {0}")]
    Api(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl WeatherError {
    /// Short text suitable for a log line the user might read.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingSetting(field) => format!("Set the {} in the plugin settings.", field),
            Self::InvalidApiKey => "Weather API key is invalid. Check settings.".to_string(),
            Self::LocationNotFound(_) => "Location not found. Check and try again.".to_string(),
            Self::RateLimited(secs) => format!("Too many requests. Please wait {} seconds.", secs),
            Self::Api(_) => "Weather service error. Please try again.".to_string(),
            Self::Parse(_) => "Received an unexpected weather response.".to_string(),
            Self::Network(_) => "Network error. Check your connection.".to_string(),
        }
    }
}

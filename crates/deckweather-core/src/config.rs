use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Smallest and largest refresh values the property inspector accepts.
const REFRESH_INPUT_MIN: u32 = 3;
const REFRESH_INPUT_MAX: u32 = 60;

/// Whether a config issue stops startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The plugin cannot run with this value.
    Error,
    /// The plugin runs, but weather will not show until it is fixed.
    Warning,
}

/// One problem found in the config file, keyed by its dotted TOML path.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub field: &'static str,
    pub message: String,
    pub severity: Severity,
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Everything [`PluginConfig::validate`] found, in check order.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub issues: Vec<ConfigIssue>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors().next().is_none()
    }

    pub fn errors(&self) -> impl Iterator<Item = &ConfigIssue> {
        self.with_severity(Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ConfigIssue> {
        self.with_severity(Severity::Warning)
    }

    fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &ConfigIssue> {
        self.issues.iter().filter(move |i| i.severity == severity)
    }

    fn push(&mut self, severity: Severity, field: &'static str, message: impl Into<String>) {
        self.issues.push(ConfigIssue {
            field,
            message: message.into(),
            severity,
        });
    }

    /// Errors joined into one line for [`ConfigError::Invalid`].
    pub fn error_summary(&self) -> String {
        self.errors()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Plugin configuration file (`config.toml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Weather provider settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Log filter used when `RUST_LOG` is unset
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Global settings served to the action by the standalone host
    #[serde(default)]
    pub settings: GlobalSettingsConfig,
}

/// Unit system requested from the weather provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Imperial,
    Metric,
    Standard,
}

impl Units {
    /// Value of the provider's `units` query parameter.
    pub fn as_query(&self) -> &'static str {
        match self {
            Self::Imperial => "imperial",
            Self::Metric => "metric",
            Self::Standard => "standard",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Current-conditions endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub units: Units,

    /// Per-request timeout. Absent means requests may wait indefinitely.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_endpoint() -> String {
    "https://api.openweathermap.org/data/2.5/weather".to_string()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            units: Units::default(),
            request_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalSettingsConfig {
    /// OpenWeather API key
    #[serde(default)]
    pub openweather_api_key: String,

    /// `"<lat>,<lon>"` or a free-form location name
    #[serde(default)]
    pub lat_long: String,

    /// Refresh period as entered in the property inspector (0 = disabled)
    #[serde(default)]
    pub refresh_time: u32,
}

impl PluginConfig {
    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let config = Self::default();
            config.save_to(&config_path)?;
            return Ok(config);
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;

        let config: PluginConfig = toml::from_str(&contents)?;

        Ok(config)
    }

    /// Validate a loaded configuration
    ///
    /// Warnings are logged; errors reject the configuration.
    pub fn into_validated(self) -> Result<(Self, ValidationResult), ConfigError> {
        let validation = self.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()));
        }

        for warning in validation.warnings() {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((self, validation))
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.weather.endpoint, "weather.endpoint", &mut result);

        if self.weather.request_timeout_secs == Some(0) {
            result.push(
                Severity::Error,
                "weather.request_timeout_secs",
                "Timeout must be greater than 0 (omit it to disable)",
            );
        }

        if self.settings.openweather_api_key.trim().is_empty() {
            result.push(
                Severity::Warning,
                "settings.openweather_api_key",
                "No API key configured - weather requests will fail",
            );
        }

        if self.settings.lat_long.trim().is_empty() {
            result.push(Severity::Warning, "settings.lat_long", "No location configured");
        }

        let refresh = self.settings.refresh_time;
        if refresh != 0 && !(REFRESH_INPUT_MIN..=REFRESH_INPUT_MAX).contains(&refresh) {
            result.push(
                Severity::Warning,
                "settings.refresh_time",
                format!(
                    "{} is outside {}..={}; auto-refresh will be disabled",
                    refresh, REFRESH_INPUT_MIN, REFRESH_INPUT_MAX
                ),
            );
        }

        result
    }

    fn validate_url(
        &self,
        url_str: &str,
        field_name: &'static str,
        result: &mut ValidationResult,
    ) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.push(
                        Severity::Error,
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.push(Severity::Error, field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.push(Severity::Error, field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to an explicit path, creating parent directories
    pub fn save_to(&self, config_path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
        }

        let contents = toml::to_string_pretty(self)?;

        std::fs::write(config_path, contents).map_err(|e| ConfigError::io(config_path, e))?;

        Ok(())
    }

    /// Path to the configuration file
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NoConfigDir)?
            .join("deckweather");

        Ok(config_dir.join("config.toml"))
    }
}

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use deckweather_core::Units;
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::location::Location;
use crate::types::{WeatherError, WeatherSnapshot};

/// Anything that can produce current conditions for a key and location.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch_weather(
        &self,
        api_key: &str,
        location: &str,
    ) -> Result<WeatherSnapshot, WeatherError>;
}

/// OpenWeather current-conditions client.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    client: Client,
    endpoint: String,
    units: Units,
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    main: Option<MainBlock>,
    wind: Option<WindBlock>,
    #[serde(default)]
    weather: Vec<ConditionBlock>,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: Option<f64>,
    humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WindBlock {
    speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ConditionBlock {
    description: Option<String>,
    icon: Option<String>,
}

impl From<CurrentResponse> for WeatherSnapshot {
    fn from(resp: CurrentResponse) -> Self {
        let condition = resp.weather.into_iter().next();
        let (description, icon) = match condition {
            Some(c) => (c.description, c.icon),
            None => (None, None),
        };

        Self {
            temperature: resp.main.as_ref().and_then(|m| m.temp),
            humidity: resp.main.as_ref().and_then(|m| m.humidity),
            wind_speed: resp.wind.and_then(|w| w.speed),
            description,
            icon,
            fetched_at: Utc::now(),
        }
    }
}

impl OpenWeatherProvider {
    /// `timeout` of `None` leaves requests unbounded.
    pub fn new(
        endpoint: impl Into<String>,
        units: Units,
        timeout: Option<Duration>,
    ) -> Result<Self, WeatherError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            units,
        })
    }

    pub fn units(&self) -> Units {
        self.units
    }

    async fn handle_response(
        &self,
        response: reqwest::Response,
        location: &str,
    ) -> Result<WeatherSnapshot, WeatherError> {
        let status = response.status();

        if status.is_success() {
            let body = response.text().await?;
            let parsed: CurrentResponse = serde_json::from_str(&body)
                .map_err(|e| WeatherError::Parse(format!("JSON parse error: {}", e)))?;
            Ok(parsed.into())
        } else if status.as_u16() == 401 {
            Err(WeatherError::InvalidApiKey)
        } else if status.as_u16() == 404 {
            Err(WeatherError::LocationNotFound(location.to_string()))
        } else if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            Err(WeatherError::RateLimited(retry_after))
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(WeatherError::Api(format!("{}: {}", status, text)))
        }
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherProvider {
    #[instrument(skip(self, api_key), level = "debug")]
    async fn fetch_weather(
        &self,
        api_key: &str,
        location: &str,
    ) -> Result<WeatherSnapshot, WeatherError> {
        if api_key.trim().is_empty() {
            return Err(WeatherError::MissingSetting("API key"));
        }
        if location.trim().is_empty() {
            return Err(WeatherError::MissingSetting("location"));
        }

        let mut query = Location::parse(location).query_pairs();
        query.push(("appid", api_key.trim().to_string()));
        query.push(("units", self.units.as_query().to_string()));

        tracing::info!("Fetching weather data");
        let response = self.client.get(&self.endpoint).query(&query).send().await?;

        self.handle_response(response, location).await
    }
}

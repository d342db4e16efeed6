//! Weather provider for deckweather
//!
//! Fetches current conditions from OpenWeather and exposes them as a
//! [`WeatherSnapshot`] through the [`WeatherSource`] trait.

pub mod location;
pub mod provider;
pub mod types;

pub use location::Location;
pub use provider::{OpenWeatherProvider, WeatherSource};
pub use types::*;

//! Fetch current weather and draw it onto a target.

use deckweather_weather::{is_known_icon, WeatherError, WeatherSnapshot, WeatherSource};
use thiserror::Error;

use crate::settings::SettingsMemo;
use crate::target::{RefreshTarget, TargetError};

/// Directory of the per-icon key images inside the plugin bundle.
pub const IMAGE_DIR: &str = "imgs/actions/display-weather";

/// Why a refresh left the display untouched.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("Weather fetch failed: {0}")]
    Weather(#[from] WeatherError),

    #[error("Display update failed: {0}")]
    Target(#[from] TargetError),
}

/// What started a refresh. Only used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    Manual,
    Interval,
}

/// Image for `icon`, or `None` when there is no artwork for it.
pub fn image_path(icon: &str) -> Option<String> {
    is_known_icon(icon).then(|| format!("{}/{}", IMAGE_DIR, icon))
}

/// Key title: temperature, humidity, four blank lines, wind speed.
///
/// Temperature and wind are rounded half-up to one decimal place; humidity to
/// a whole percent. A missing reading prints as a bare `0`.
pub fn render_title(
    temperature: Option<f64>,
    humidity: Option<f64>,
    wind_speed: Option<f64>,
) -> String {
    format!(
        "{}°, {}%\n\n\n\n{} mph",
        one_decimal(temperature),
        whole(humidity),
        one_decimal(wind_speed)
    )
}

fn round_half_up(value: f64, scale: f64) -> f64 {
    (value * scale + 0.5).floor() / scale
}

fn one_decimal(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1}", round_half_up(v, 10.0)),
        None => "0".to_string(),
    }
}

fn whole(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{}", round_half_up(v, 1.0) as i64),
        None => "0".to_string(),
    }
}

/// Fetch current weather with the shared settings and render it on `target`.
///
/// The image is only touched for known icon codes. Nothing is drawn when the
/// fetch fails.
pub async fn refresh_target(
    memo: &SettingsMemo,
    source: &dyn WeatherSource,
    target: &dyn RefreshTarget,
) -> Result<WeatherSnapshot, RefreshError> {
    let settings = memo.get();
    let snapshot = source
        .fetch_weather(&settings.openweather_api_key, &settings.lat_long)
        .await?;

    match snapshot.icon.as_deref() {
        Some(icon) => match image_path(icon) {
            Some(path) => target.set_image(&path).await?,
            None => tracing::debug!("No image for icon code {:?}", icon),
        },
        None => tracing::debug!("Snapshot carried no icon code"),
    }

    let title = render_title(snapshot.temperature, snapshot.humidity, snapshot.wind_speed);
    target.set_title(&title).await?;

    Ok(snapshot)
}

/// [`refresh_target`] plus the failure policy: log once, keep the display.
pub(crate) async fn refresh_and_log(
    memo: &SettingsMemo,
    source: &dyn WeatherSource,
    target: &dyn RefreshTarget,
    trigger: RefreshTrigger,
) -> Result<WeatherSnapshot, RefreshError> {
    tracing::info!(target_id = target.id(), ?trigger, "Setting key info");

    let result = refresh_target(memo, source, target).await;
    if let Err(e) = &result {
        tracing::warn!(
            target_id = target.id(),
            ?trigger,
            "Refresh skipped, keeping previous display: {}",
            e
        );
    }
    result
}

//! Shared user settings and change detection.

use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::watch;

/// User settings entered in the property inspector. One value per process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSettings {
    #[serde(default)]
    pub openweather_api_key: String,

    /// `"<lat>,<lon>"` or a place name
    #[serde(default)]
    pub lat_long: String,

    /// Requested refresh period; 0 disables periodic refresh
    #[serde(default, deserialize_with = "lenient_refresh_time")]
    pub refresh_time: u32,
}

/// The inspector sends numbers, numeric strings, blanks or nothing at all.
/// Anything that is not a non-negative number reads as 0.
fn lenient_refresh_time<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let value = match raw {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    Ok(match value {
        Some(v) if v.is_finite() && v >= 0.0 => v.floor() as u32,
        _ => 0,
    })
}

/// Shared store for [`WeatherSettings`] with change notification.
///
/// Starts zero-valued. Values are replaced wholesale, never merged.
#[derive(Debug)]
pub struct SettingsMemo {
    tx: watch::Sender<WeatherSettings>,
}

impl SettingsMemo {
    pub fn new() -> Self {
        tracing::info!("Creating settings store");
        let (tx, _rx) = watch::channel(WeatherSettings::default());
        Self { tx }
    }

    pub fn get(&self) -> WeatherSettings {
        self.tx.borrow().clone()
    }

    pub fn set(&self, settings: WeatherSettings) {
        self.tx.send_replace(settings);
    }

    /// Store `settings` if any field differs from the current value.
    ///
    /// Returns `true` when the stored value changed.
    pub fn memoize(&self, settings: WeatherSettings) -> bool {
        tracing::info!("Upserting settings: {}s", settings.refresh_time);

        let changed = self.tx.send_if_modified(|current| {
            if *current == settings {
                false
            } else {
                *current = settings;
                true
            }
        });

        if changed {
            tracing::info!("New settings detected");
        } else {
            tracing::debug!("Existing settings detected");
        }
        changed
    }

    /// Receiver woken whenever the stored settings change.
    pub fn subscribe(&self) -> watch::Receiver<WeatherSettings> {
        self.tx.subscribe()
    }
}

impl Default for SettingsMemo {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(key: &str, loc: &str, refresh: u32) -> WeatherSettings {
        WeatherSettings {
            openweather_api_key: key.to_string(),
            lat_long: loc.to_string(),
            refresh_time: refresh,
        }
    }

    #[test]
    fn test_starts_zero_valued() {
        let memo = SettingsMemo::new();
        assert_eq!(memo.get(), WeatherSettings::default());
        assert_eq!(memo.get().refresh_time, 0);
    }

    #[test]
    fn test_memoize_reports_change_once() {
        let memo = SettingsMemo::new();
        let s = settings("key", "40.7,-74.0", 10);

        assert!(memo.memoize(s.clone()));
        assert!(!memo.memoize(s.clone()));
        assert!(!memo.memoize(s.clone()));
        assert_eq!(memo.get(), s);
    }

    #[test]
    fn test_memoize_zero_value_is_unchanged() {
        let memo = SettingsMemo::new();
        assert!(!memo.memoize(WeatherSettings::default()));
    }

    #[test]
    fn test_memoize_detects_each_field() {
        let memo = SettingsMemo::new();
        memo.set(settings("key", "loc", 10));

        assert!(memo.memoize(settings("other", "loc", 10)));
        assert!(memo.memoize(settings("other", "elsewhere", 10)));
        assert!(memo.memoize(settings("other", "elsewhere", 20)));
        assert_eq!(memo.get(), settings("other", "elsewhere", 20));
    }

    #[test]
    fn test_set_replaces_wholesale() {
        let memo = SettingsMemo::new();
        memo.set(settings("key", "loc", 10));
        memo.set(settings("", "", 0));
        assert_eq!(memo.get(), WeatherSettings::default());
    }

    #[test]
    fn test_subscribers_see_changes_only() {
        let memo = SettingsMemo::new();
        let mut rx = memo.subscribe();
        assert!(!rx.has_changed().unwrap());

        memo.memoize(WeatherSettings::default());
        assert!(!rx.has_changed().unwrap());

        memo.memoize(settings("key", "loc", 5));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().refresh_time, 5);
    }

    #[test]
    fn test_deserialize_host_payload() {
        let s: WeatherSettings = serde_json::from_value(serde_json::json!({
            "openweatherApiKey": "abc",
            "latLong": "40.7,-74.0",
            "refreshTime": 15
        }))
        .unwrap();
        assert_eq!(s, settings("abc", "40.7,-74.0", 15));
    }

    #[test]
    fn test_deserialize_lenient_refresh_time() {
        let parse = |v: serde_json::Value| -> u32 {
            serde_json::from_value::<WeatherSettings>(serde_json::json!({ "refreshTime": v }))
                .unwrap()
                .refresh_time
        };

        assert_eq!(parse(serde_json::json!("30")), 30);
        assert_eq!(parse(serde_json::json!(" 7 ")), 7);
        assert_eq!(parse(serde_json::json!("")), 0);
        assert_eq!(parse(serde_json::json!(null)), 0);
        assert_eq!(parse(serde_json::json!(-4)), 0);
        assert_eq!(parse(serde_json::json!(12.9)), 12);
        assert_eq!(parse(serde_json::json!("soon")), 0);
    }

    #[test]
    fn test_deserialize_missing_fields() {
        let s: WeatherSettings = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(s, WeatherSettings::default());
    }
}

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use deckweather_core::{AppError, GlobalSettingsConfig, PluginConfig};
use deckweather_refresh::{
    DisplayWeather, GlobalSettingsSource, HostError, RefreshScheduler, RefreshTarget,
    SettingsMemo, TargetError, WeatherSettings, ACTION_UUID,
};
use deckweather_weather::OpenWeatherProvider;

const CONSOLE_TARGET_ID: &str = "console";

/// Serves the `[settings]` table of the config file as the host's global
/// settings.
struct ConfigSettings(WeatherSettings);

impl From<&GlobalSettingsConfig> for ConfigSettings {
    fn from(cfg: &GlobalSettingsConfig) -> Self {
        Self(WeatherSettings {
            openweather_api_key: cfg.openweather_api_key.clone(),
            lat_long: cfg.lat_long.clone(),
            refresh_time: cfg.refresh_time,
        })
    }
}

#[async_trait]
impl GlobalSettingsSource for ConfigSettings {
    async fn get_global_settings(&self) -> Result<WeatherSettings, HostError> {
        Ok(self.0.clone())
    }
}

/// Stand-in for a physical key: whatever it would show goes to the log.
struct ConsoleTarget {
    id: String,
}

#[async_trait]
impl RefreshTarget for ConsoleTarget {
    fn id(&self) -> &str {
        &self.id
    }

    async fn set_title(&self, title: &str) -> Result<(), TargetError> {
        tracing::info!(target_id = %self.id, "Title: {:?}", title);
        Ok(())
    }

    async fn set_image(&self, image: &str) -> Result<(), TargetError> {
        tracing::info!(target_id = %self.id, "Image: {}", image);
        Ok(())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("{}", e.user_message());
            eprintln!("  {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), AppError> {
    let config = PluginConfig::load()?;
    deckweather_core::init_logging(&config.logging.filter)?;
    let (config, _validation) = config.into_validated()?;

    let timeout = config.weather.request_timeout_secs.map(Duration::from_secs);
    let provider = OpenWeatherProvider::new(config.weather.endpoint.clone(), config.weather.units, timeout)
        .map_err(|e| AppError::Startup(e.to_string()))?;
    tracing::info!(
        endpoint = %config.weather.endpoint,
        units = provider.units().as_query(),
        "Weather provider ready"
    );

    let memo = Arc::new(SettingsMemo::new());
    let scheduler = Arc::new(RefreshScheduler::new(memo.clone(), Arc::new(provider)));
    let host = Arc::new(ConfigSettings::from(&config.settings));
    let action = DisplayWeather::new(memo.clone(), scheduler.clone(), host);
    tracing::info!("Registered action {}", ACTION_UUID);

    let mut changes = memo.subscribe();
    let watcher = tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            let settings = changes.borrow_and_update().clone();
            tracing::info!(
                refresh_time = settings.refresh_time,
                location = %settings.lat_long,
                "Settings changed"
            );
        }
    });

    let target = Arc::new(ConsoleTarget {
        id: CONSOLE_TARGET_ID.to_string(),
    });
    let outcome = action
        .on_will_appear(target)
        .await
        .map_err(|e| AppError::Startup(e.to_string()))?;
    tracing::info!(
        decision = ?outcome.decision,
        interval = ?outcome.interval,
        "Console target scheduled; press Ctrl-C to exit"
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    action.on_will_disappear(CONSOLE_TARGET_ID).await;
    scheduler.shutdown().await;
    watcher.abort();

    tracing::info!("deckweather stopped");
    Ok(())
}

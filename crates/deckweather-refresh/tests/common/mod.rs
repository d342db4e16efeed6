//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use deckweather_refresh::{
    GlobalSettingsSource, HostError, RefreshScheduler, RefreshTarget, SettingsMemo, TargetError,
    WeatherSettings,
};
use deckweather_weather::{WeatherError, WeatherSnapshot, WeatherSource};
use parking_lot::Mutex;
use tokio::sync::Notify;

/// Weather source returning a fixed snapshot, or failing on demand.
///
/// After [`MockSource::hold`], fetches block until [`MockSource::release`].
pub struct MockSource {
    fetches: AtomicUsize,
    failing: AtomicBool,
    gate: Mutex<Option<Arc<Notify>>>,
    icon: String,
}

impl MockSource {
    pub fn new(icon: &str) -> Arc<Self> {
        Arc::new(Self {
            fetches: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            gate: Mutex::new(None),
            icon: icon.to_string(),
        })
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn hold(&self) {
        *self.gate.lock() = Some(Arc::new(Notify::new()));
    }

    pub fn release(&self) {
        if let Some(gate) = self.gate.lock().take() {
            gate.notify_one();
        }
    }
}

#[async_trait]
impl WeatherSource for MockSource {
    async fn fetch_weather(
        &self,
        _api_key: &str,
        _location: &str,
    ) -> Result<WeatherSnapshot, WeatherError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(WeatherError::Api("500 Internal Server Error".into()));
        }
        Ok(WeatherSnapshot::new(
            Some(72.34),
            Some(55.0),
            Some(4.96),
            Some(self.icon.as_str()),
        ))
    }
}

/// Target recording everything drawn on it.
pub struct MockTarget {
    id: String,
    pub titles: Mutex<Vec<String>>,
    pub images: Mutex<Vec<String>>,
}

impl MockTarget {
    pub fn new(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            titles: Mutex::new(Vec::new()),
            images: Mutex::new(Vec::new()),
        })
    }

    pub fn title_count(&self) -> usize {
        self.titles.lock().len()
    }
}

#[async_trait]
impl RefreshTarget for MockTarget {
    fn id(&self) -> &str {
        &self.id
    }

    async fn set_title(&self, title: &str) -> Result<(), TargetError> {
        self.titles.lock().push(title.to_string());
        Ok(())
    }

    async fn set_image(&self, image: &str) -> Result<(), TargetError> {
        self.images.lock().push(image.to_string());
        Ok(())
    }
}

/// Host whose global settings can be swapped between calls.
pub struct MockHost {
    settings: Mutex<Option<WeatherSettings>>,
}

impl MockHost {
    pub fn new(settings: WeatherSettings) -> Arc<Self> {
        Arc::new(Self {
            settings: Mutex::new(Some(settings)),
        })
    }

    pub fn disconnected() -> Arc<Self> {
        Arc::new(Self {
            settings: Mutex::new(None),
        })
    }

    pub fn replace(&self, settings: WeatherSettings) {
        *self.settings.lock() = Some(settings);
    }
}

#[async_trait]
impl GlobalSettingsSource for MockHost {
    async fn get_global_settings(&self) -> Result<WeatherSettings, HostError> {
        self.settings.lock().clone().ok_or(HostError::Disconnected)
    }
}

pub fn settings(refresh_time: u32) -> WeatherSettings {
    WeatherSettings {
        openweather_api_key: "test-key".to_string(),
        lat_long: "45.52,-122.68".to_string(),
        refresh_time,
    }
}

pub fn scheduler(source: Arc<MockSource>, refresh_time: u32) -> (Arc<SettingsMemo>, RefreshScheduler) {
    let memo = Arc::new(SettingsMemo::new());
    memo.set(settings(refresh_time));
    let scheduler = RefreshScheduler::new(memo.clone(), source);
    (memo, scheduler)
}

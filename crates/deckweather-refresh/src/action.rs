//! Entry points the device host calls for the "display weather" action.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;

use crate::scheduler::{RefreshScheduler, Rescheduled};
use crate::settings::{SettingsMemo, WeatherSettings};
use crate::target::RefreshTarget;

/// Manifest identifier of the action.
pub const ACTION_UUID: &str = "dev.deckweather.display-weather";

/// Errors talking to the device host.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Host connection closed")]
    Disconnected,

    #[error("Malformed settings payload: {0}")]
    Payload(String),
}

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Failed to read global settings: {0}")]
    Host(#[from] HostError),
}

/// Read access to the host's plugin-wide settings store.
#[async_trait]
pub trait GlobalSettingsSource: Send + Sync {
    async fn get_global_settings(&self) -> Result<WeatherSettings, HostError>;
}

/// The weather action: keeps every visible target refreshed with the shared
/// settings.
pub struct DisplayWeather {
    memo: Arc<SettingsMemo>,
    scheduler: Arc<RefreshScheduler>,
    host: Arc<dyn GlobalSettingsSource>,
    visible: Mutex<HashMap<String, Arc<dyn RefreshTarget>>>,
}

impl DisplayWeather {
    pub fn new(
        memo: Arc<SettingsMemo>,
        scheduler: Arc<RefreshScheduler>,
        host: Arc<dyn GlobalSettingsSource>,
    ) -> Self {
        Self {
            memo,
            scheduler,
            host,
            visible: Mutex::new(HashMap::new()),
        }
    }

    /// A target became visible (startup, page or folder change).
    pub async fn on_will_appear(
        &self,
        target: Arc<dyn RefreshTarget>,
    ) -> Result<Rescheduled, ActionError> {
        self.sync_and_reschedule(target).await
    }

    /// The user pressed the key: refresh now, keep or fix the timer.
    pub async fn on_key_down(
        &self,
        target: Arc<dyn RefreshTarget>,
    ) -> Result<Rescheduled, ActionError> {
        self.sync_and_reschedule(target).await
    }

    /// A target went away; its timer goes with it. Returns whether a timer
    /// was running.
    pub async fn on_will_disappear(&self, target_id: &str) -> bool {
        self.visible.lock().remove(target_id);
        self.scheduler.stop(target_id).await
    }

    /// The property inspector saved new global settings.
    ///
    /// Visible targets are rescheduled only when the settings actually
    /// changed.
    pub async fn on_did_receive_global_settings(
        &self,
        settings: WeatherSettings,
    ) -> Vec<Rescheduled> {
        tracing::info!(
            "Detected global settings event (refreshTime: {}s)",
            settings.refresh_time
        );

        if !self.memo.memoize(settings) {
            return Vec::new();
        }
        self.reschedule_visible(None).await
    }

    pub fn visible_count(&self) -> usize {
        self.visible.lock().len()
    }

    fn track(&self, target: &Arc<dyn RefreshTarget>) {
        self.visible
            .lock()
            .insert(target.id().to_string(), target.clone());
    }

    /// Reschedule every visible target except `skip` with the stored period.
    async fn reschedule_visible(&self, skip: Option<&str>) -> Vec<Rescheduled> {
        let targets: Vec<Arc<dyn RefreshTarget>> = self
            .visible
            .lock()
            .values()
            .filter(|t| Some(t.id()) != skip)
            .cloned()
            .collect();
        tracing::info!(
            "Detected settings change, rescheduling {} targets",
            targets.len()
        );

        let period = self.memo.get().refresh_time;
        let mut results = Vec::with_capacity(targets.len());
        for target in targets {
            results.push(self.scheduler.reschedule(target, period).await);
        }
        results
    }

    /// Read the host settings, then reschedule `target`. A target is only
    /// tracked once the host answered; a change seen here reaches every other
    /// visible target too.
    async fn sync_and_reschedule(
        &self,
        target: Arc<dyn RefreshTarget>,
    ) -> Result<Rescheduled, ActionError> {
        let settings = self.host.get_global_settings().await?;
        self.track(&target);

        if self.memo.memoize(settings) {
            self.reschedule_visible(Some(target.id())).await;
        }

        let period = self.memo.get().refresh_time;
        Ok(self.scheduler.reschedule(target, period).await)
    }
}

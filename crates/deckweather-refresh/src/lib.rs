//! Refresh scheduling for the weather key/dial action.
//!
//! - [`SettingsMemo`] holds the shared user settings and detects changes.
//! - [`RefreshScheduler`] keeps at most one periodic timer per target.
//! - [`refresh_target`] fetches current weather and renders it.
//! - [`DisplayWeather`] is what the device host calls into.

pub mod action;
pub mod render;
pub mod scheduler;
pub mod settings;
pub mod target;

pub use action::{ActionError, DisplayWeather, GlobalSettingsSource, HostError, ACTION_UUID};
pub use render::{image_path, refresh_target, render_title, RefreshError, RefreshTrigger};
pub use scheduler::{
    effective_period, interval_for, RefreshScheduler, Rescheduled, ScheduleDecision, TimerInfo,
    MAX_INTERVAL, MIN_INTERVAL, REFRESH_MAX, REFRESH_MIN,
};
pub use settings::{SettingsMemo, WeatherSettings};
pub use target::{RefreshTarget, TargetError};

//! Per-target periodic refresh.
//!
//! Each target owns at most one timer. Rescheduling decides, under that
//! target's lock, whether the current timer can stay, must be replaced, or
//! must go; it then always refreshes the target once immediately.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use deckweather_weather::{WeatherSnapshot, WeatherSource};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::render::{refresh_and_log, RefreshError, RefreshTrigger};
use crate::settings::SettingsMemo;
use crate::target::RefreshTarget;

/// Accepted range of the user-entered refresh value.
pub const REFRESH_MIN: u32 = 3;
pub const REFRESH_MAX: u32 = 60;

/// Milliseconds scheduled per unit of the refresh value.
const MS_PER_REFRESH_UNIT: u64 = 60_000;

/// Absolute bounds on the polling interval, whatever the user asked for.
pub const MIN_INTERVAL: Duration = Duration::from_millis(300_000);
pub const MAX_INTERVAL: Duration = Duration::from_millis(36_000_000);

/// Normalize a requested refresh value: 0 (disabled) unless it lies in
/// `REFRESH_MIN..=REFRESH_MAX`.
pub fn effective_period(requested: u32) -> u32 {
    if (REFRESH_MIN..=REFRESH_MAX).contains(&requested) {
        requested.clamp(REFRESH_MIN, REFRESH_MAX)
    } else {
        0
    }
}

/// Timer interval for an effective period, kept inside
/// `MIN_INTERVAL..=MAX_INTERVAL`. `None` when periodic refresh is disabled.
pub fn interval_for(effective: u32) -> Option<Duration> {
    if effective == 0 {
        return None;
    }
    let ms = u64::from(effective) * MS_PER_REFRESH_UNIT;
    Some(Duration::from_millis(ms).clamp(MIN_INTERVAL, MAX_INTERVAL))
}

/// What a reschedule did to a target's timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleDecision {
    /// No timer before, none requested.
    Idle,
    /// Existing timer already runs at the requested interval.
    Kept,
    /// No timer before; one was installed.
    Installed,
    /// Existing timer cancelled and a new one installed.
    Replaced,
    /// Existing timer cancelled; periodic refresh is now off.
    Cancelled,
}

impl ScheduleDecision {
    pub fn decide(existing: Option<Duration>, requested: Option<Duration>) -> Self {
        match (existing, requested) {
            (None, None) => Self::Idle,
            (Some(current), Some(new)) if current == new => Self::Kept,
            (Some(_), Some(_)) => Self::Replaced,
            (None, Some(_)) => Self::Installed,
            (Some(_), None) => Self::Cancelled,
        }
    }

    fn cancels(self) -> bool {
        matches!(self, Self::Replaced | Self::Cancelled)
    }

    fn installs(self) -> bool {
        matches!(self, Self::Installed | Self::Replaced)
    }
}

/// Result of [`RefreshScheduler::reschedule`].
#[derive(Debug)]
pub struct Rescheduled {
    pub decision: ScheduleDecision,
    /// Interval of the timer now running for the target, if any
    pub interval: Option<Duration>,
    /// Outcome of the immediate refresh
    pub refresh: Result<WeatherSnapshot, RefreshError>,
}

/// Public view of a live timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerInfo {
    pub id: u64,
    pub interval: Duration,
}

struct RefreshHandle {
    id: u64,
    interval: Duration,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Stop future ticks. A tick already fetching runs to completion.
    fn cancel(self) -> JoinHandle<()> {
        tracing::info!("Clearing interval {}", self.id);
        self.cancel.cancel();
        self.task
    }

    fn info(&self) -> TimerInfo {
        TimerInfo {
            id: self.id,
            interval: self.interval,
        }
    }
}

type Slot = Arc<tokio::sync::Mutex<Option<RefreshHandle>>>;

/// Registry of refresh timers, keyed by target id.
pub struct RefreshScheduler {
    memo: Arc<SettingsMemo>,
    source: Arc<dyn WeatherSource>,
    slots: Mutex<HashMap<String, Slot>>,
    next_id: AtomicU64,
}

impl RefreshScheduler {
    pub fn new(memo: Arc<SettingsMemo>, source: Arc<dyn WeatherSource>) -> Self {
        Self {
            memo,
            source,
            slots: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn slot(&self, target_id: &str) -> Slot {
        self.slots
            .lock()
            .entry(target_id.to_string())
            .or_default()
            .clone()
    }

    fn existing_slot(&self, target_id: &str) -> Option<Slot> {
        self.slots.lock().get(target_id).cloned()
    }

    fn all_slots(&self) -> Vec<(String, Slot)> {
        self.slots
            .lock()
            .iter()
            .map(|(id, slot)| (id.clone(), slot.clone()))
            .collect()
    }

    /// Drop `target_id`'s entry if it holds no timer and nobody else is
    /// using it. New users must go through the map lock held here, so the
    /// slot cannot be picked up again after the check.
    fn prune(&self, target_id: &str, slot: Slot) {
        let mut slots = self.slots.lock();
        let ours = slots.get(target_id).is_some_and(|s| Arc::ptr_eq(s, &slot));
        // One reference in the map, one here.
        let unshared = Arc::strong_count(&slot) == 2;
        let empty = slot.try_lock().is_ok_and(|g| g.is_none());
        if ours && unshared && empty {
            slots.remove(target_id);
        }
    }

    /// Bring `target`'s timer in line with `requested`, then refresh it once.
    ///
    /// The immediate refresh always runs and is awaited, whatever happened to
    /// the timer.
    pub async fn reschedule(&self, target: Arc<dyn RefreshTarget>, requested: u32) -> Rescheduled {
        let interval = interval_for(effective_period(requested));
        let slot = self.slot(target.id());

        let decision = {
            let mut current = slot.lock().await;
            let decision =
                ScheduleDecision::decide(current.as_ref().map(|h| h.interval), interval);

            if decision.cancels() {
                if let Some(handle) = current.take() {
                    drop(handle.cancel());
                }
            }
            if decision.installs() {
                if let Some(interval) = interval {
                    *current = Some(self.spawn_timer(target.clone(), interval));
                }
            }
            decision
        };
        if matches!(decision, ScheduleDecision::Idle | ScheduleDecision::Cancelled) {
            self.prune(target.id(), slot);
        }

        tracing::debug!(
            target_id = target.id(),
            requested,
            ?decision,
            "Rescheduled refresh"
        );

        let refresh = refresh_and_log(
            &self.memo,
            self.source.as_ref(),
            target.as_ref(),
            RefreshTrigger::Manual,
        )
        .await;

        Rescheduled {
            decision,
            interval,
            refresh,
        }
    }

    fn spawn_timer(&self, target: Arc<dyn RefreshTarget>, interval: Duration) -> RefreshHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();

        tracing::info!(
            target_id = target.id(),
            "Creating interval {} with {}ms",
            id,
            interval.as_millis()
        );

        let token = cancel.clone();
        let memo = self.memo.clone();
        let source = self.source.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                // Failures are logged inside; the timer keeps running.
                let _ = refresh_and_log(
                    &memo,
                    source.as_ref(),
                    target.as_ref(),
                    RefreshTrigger::Interval,
                )
                .await;
            }

            tracing::debug!("Interval {} stopped", id);
        });

        RefreshHandle {
            id,
            interval,
            cancel,
            task,
        }
    }

    /// Cancel `target_id`'s timer. Returns whether one was running.
    pub async fn stop(&self, target_id: &str) -> bool {
        let Some(slot) = self.existing_slot(target_id) else {
            return false;
        };
        let handle = slot.lock().await.take();
        self.prune(target_id, slot);
        match handle {
            Some(handle) => {
                drop(handle.cancel());
                true
            }
            None => false,
        }
    }

    pub async fn active_timer(&self, target_id: &str) -> Option<TimerInfo> {
        let slot = self.existing_slot(target_id)?;
        let guard = slot.lock().await;
        guard.as_ref().map(RefreshHandle::info)
    }

    /// Number of live timers across all targets.
    pub async fn active_count(&self) -> usize {
        let mut count = 0;
        for (_, slot) in self.all_slots() {
            if slot.lock().await.is_some() {
                count += 1;
            }
        }
        count
    }

    /// Number of targets the registry currently holds an entry for.
    pub fn tracked_targets(&self) -> usize {
        self.slots.lock().len()
    }

    /// Cancel every timer and wait for in-flight ticks to finish.
    pub async fn shutdown(&self) {
        let mut tasks = Vec::new();
        for (id, slot) in self.all_slots() {
            let handle = slot.lock().await.take();
            if let Some(handle) = handle {
                tasks.push(handle.cancel());
            }
            self.prune(&id, slot);
        }

        tracing::info!("Stopping {} refresh timers", tasks.len());
        for task in tasks {
            if let Err(e) = task.await {
                tracing::warn!("Refresh timer ended abnormally: {}", e);
            }
        }
    }
}

//! Named recurring alarms.
//!
//! Mirrors the browser alarm facility: an alarm has a name, an initial delay,
//! and a period. Every firing broadcasts the alarm's name to all
//! subscribers; listeners filter on the names they care about.
//!
//! [`TokioAlarms`] drives each alarm with its own tokio task.
//!
//! # Example
//!
//! ```ignore
//! let alarms = TokioAlarms::new();
//! let mut fired = alarms.subscribe();
//! alarms.create("refresh", AlarmSchedule::new(Duration::from_secs(60), Duration::from_secs(3600)));
//!
//! while let Ok(name) = fired.recv().await {
//!     if name == "refresh" { /* ... */ }
//! }
//! ```

use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

// ============================================================================
// Constants
// ============================================================================

/// Buffered firings per subscriber before the slowest one starts lagging.
const CHANNEL_CAPACITY: usize = 16;

/// Shortest accepted period; zero would spin.
const MIN_PERIOD: Duration = Duration::from_millis(1);

// ============================================================================
// AlarmSchedule
// ============================================================================

/// When an alarm first fires and how often it repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmSchedule {
    /// Delay before the first firing.
    pub delay: Duration,
    /// Interval between firings.
    pub period: Duration,
}

impl AlarmSchedule {
    /// Creates a schedule.
    #[inline]
    #[must_use]
    pub const fn new(delay: Duration, period: Duration) -> Self {
        Self { delay, period }
    }
}

// ============================================================================
// AlarmScheduler
// ============================================================================

/// Recurring, named timer facility.
pub trait AlarmScheduler: Send + Sync {
    /// Schedules `name`. An existing alarm with the same name is replaced.
    fn create(&self, name: &str, schedule: AlarmSchedule);

    /// Cancels `name`. Returns `true` if it was scheduled.
    fn clear(&self, name: &str) -> bool;

    /// Receives the name of every alarm as it fires.
    fn subscribe(&self) -> broadcast::Receiver<String>;
}

// ============================================================================
// TokioAlarms
// ============================================================================

/// [`AlarmScheduler`] backed by tokio timers.
///
/// `create` must be called from within a tokio runtime. Dropping the
/// scheduler cancels every alarm.
pub struct TokioAlarms {
    timers: Mutex<FxHashMap<String, JoinHandle<()>>>,
    sender: broadcast::Sender<String>,
}

impl std::fmt::Debug for TokioAlarms {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokioAlarms")
            .field("alarms", &self.names())
            .finish_non_exhaustive()
    }
}

impl Default for TokioAlarms {
    fn default() -> Self {
        Self::new()
    }
}

impl TokioAlarms {
    /// Creates a scheduler with no alarms.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            timers: Mutex::new(FxHashMap::default()),
            sender,
        }
    }

    /// Returns `true` if `name` is scheduled.
    #[must_use]
    pub fn is_scheduled(&self, name: &str) -> bool {
        self.timers.lock().contains_key(name)
    }

    /// Names of all scheduled alarms, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.timers.lock().keys().cloned().collect();
        names.sort();
        names
    }
}

impl AlarmScheduler for TokioAlarms {
    fn create(&self, name: &str, schedule: AlarmSchedule) {
        let sender = self.sender.clone();
        let alarm = name.to_string();
        let period = schedule.period.max(MIN_PERIOD);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + schedule.delay, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                debug!(alarm = %alarm, "Alarm fired");
                // No subscribers is fine; the firing is simply unobserved.
                let _ = sender.send(alarm.clone());
            }
        });

        if let Some(previous) = self.timers.lock().insert(name.to_string(), handle) {
            previous.abort();
        }

        debug!(
            alarm = %name,
            delay_ms = schedule.delay.as_millis() as u64,
            period_ms = period.as_millis() as u64,
            "Alarm scheduled"
        );
    }

    fn clear(&self, name: &str) -> bool {
        match self.timers.lock().remove(name) {
            Some(handle) => {
                handle.abort();
                debug!(alarm = %name, "Alarm cleared");
                true
            }
            None => false,
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<String> {
        self.sender.subscribe()
    }
}

impl Drop for TokioAlarms {
    fn drop(&mut self) {
        for (_, handle) in self.timers.get_mut().drain() {
            handle.abort();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Thumbnail cleanup service.
//!
//! Evicts thumbnails older than the user's TTL on a recurring alarm,
//! independently of the count cap enforced by the cache.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::browser::{AlarmSchedule, AlarmScheduler, SettingsSource, ThumbnailTtl};
use crate::store::ThumbnailStore;

// ============================================================================
// Constants
// ============================================================================

/// Name of the recurring cleanup alarm.
pub const CLEANUP_ALARM_NAME: &str = "thumbnail-cleanup";

/// Delay before the first sweep after initialization.
pub const CLEANUP_DELAY: Duration = Duration::from_secs(60);

/// Interval between sweeps.
pub const CLEANUP_PERIOD: Duration = Duration::from_secs(60 * 60);

// ============================================================================
// ThumbnailCleanup
// ============================================================================

/// Periodic TTL sweep over a [`ThumbnailStore`].
///
/// # Example
///
/// ```ignore
/// let cleanup = Arc::new(ThumbnailCleanup::new(store, alarms, settings));
/// cleanup.initialize();
///
/// // Manual trigger.
/// let deleted = cleanup.run_cleanup().await;
/// ```
pub struct ThumbnailCleanup {
    store: Arc<dyn ThumbnailStore>,
    alarms: Arc<dyn AlarmScheduler>,
    settings: Arc<dyn SettingsSource>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for ThumbnailCleanup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThumbnailCleanup")
            .field("listening", &self.is_listening())
            .finish_non_exhaustive()
    }
}

impl ThumbnailCleanup {
    /// Creates a cleanup service. Nothing is scheduled until
    /// [`initialize`](Self::initialize).
    #[must_use]
    pub fn new(
        store: Arc<dyn ThumbnailStore>,
        alarms: Arc<dyn AlarmScheduler>,
        settings: Arc<dyn SettingsSource>,
    ) -> Self {
        Self {
            store,
            alarms,
            settings,
            listener: Mutex::new(None),
        }
    }

    /// Returns `true` while the alarm listener is running.
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.listener
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Schedules the cleanup alarm and starts listening for it.
    ///
    /// Calling it again replaces both the schedule and the listener. The
    /// listener only holds a weak reference; dropping the last `Arc` stops it.
    /// Must be called from within a tokio runtime.
    pub fn initialize(self: &Arc<Self>) {
        // Subscribe first so the first firing cannot be missed.
        let mut fired = self.alarms.subscribe();
        self.alarms.create(
            CLEANUP_ALARM_NAME,
            AlarmSchedule::new(CLEANUP_DELAY, CLEANUP_PERIOD),
        );

        let service: Weak<Self> = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            loop {
                match fired.recv().await {
                    Ok(name) if name == CLEANUP_ALARM_NAME => {
                        let Some(cleanup) = service.upgrade() else {
                            break;
                        };
                        tokio::spawn(async move {
                            cleanup.run_cleanup().await;
                        });
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Cleanup listener lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        if let Some(previous) = self.listener.lock().replace(handle) {
            previous.abort();
        }

        info!(
            alarm = CLEANUP_ALARM_NAME,
            delay_secs = CLEANUP_DELAY.as_secs(),
            period_secs = CLEANUP_PERIOD.as_secs(),
            "Thumbnail cleanup scheduled"
        );
    }

    /// Deletes thumbnails older than the configured TTL.
    ///
    /// Returns the number deleted. Safe to call at any time, with or
    /// without [`initialize`](Self::initialize).
    pub async fn run_cleanup(&self) -> usize {
        let ttl = match self.settings.load().await {
            Ok(settings) => settings.thumbnail_ttl,
            Err(e) => {
                warn!(error = %e, "Failed to load settings, using default TTL");
                ThumbnailTtl::default()
            }
        };

        let deleted = self.store.delete_expired(ttl.as_duration()).await;
        if deleted > 0 {
            info!(deleted, ttl_ms = ttl.as_millis(), "Expired thumbnails removed");
        }
        deleted
    }

    /// Cancels the alarm and stops the listener.
    pub fn shutdown(&self) {
        self.alarms.clear(CLEANUP_ALARM_NAME);
        if let Some(handle) = self.listener.lock().take() {
            handle.abort();
        }
        debug!("Thumbnail cleanup stopped");
    }
}

impl Drop for ThumbnailCleanup {
    fn drop(&mut self) {
        if let Some(handle) = self.listener.get_mut().take() {
            handle.abort();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;

    use crate::browser::{Settings, SharedSettings, TokioAlarms};
    use crate::error::{Error, Result};
    use crate::identifiers::TabId;
    use crate::store::{MemoryThumbnailStore, StoredThumbnail, epoch_ms};

    const MINUTE_MS: i64 = 60 * 1000;

    struct BrokenSettings;

    #[async_trait]
    impl SettingsSource for BrokenSettings {
        async fn load(&self) -> Result<Settings> {
            Err(Error::config("settings unavailable"))
        }
    }

    async fn seeded_store(ages_ms: &[(i64, i64)]) -> Arc<MemoryThumbnailStore> {
        let store = Arc::new(MemoryThumbnailStore::new());
        store.init().await.unwrap();
        let now = epoch_ms();
        for &(tab, age) in ages_ms {
            store
                .put(StoredThumbnail::at(TabId::new(tab), "data:x", now - age))
                .await
                .unwrap();
        }
        store
    }

    fn one_hour_settings() -> Arc<SharedSettings> {
        Arc::new(SharedSettings::new(Settings {
            thumbnail_ttl: ThumbnailTtl::OneHour,
            ..Settings::default()
        }))
    }

    #[tokio::test]
    async fn test_run_cleanup_uses_ttl() {
        let store = seeded_store(&[(1, 120 * MINUTE_MS), (2, 5 * MINUTE_MS)]).await;
        let cleanup = ThumbnailCleanup::new(
            store.clone(),
            Arc::new(TokioAlarms::new()),
            one_hour_settings(),
        );

        assert_eq!(cleanup.run_cleanup().await, 1);
        assert!(store.get(TabId::new(1)).await.is_none());
        assert!(store.get(TabId::new(2)).await.is_some());
        assert_eq!(cleanup.run_cleanup().await, 0);
    }

    #[tokio::test]
    async fn test_run_cleanup_follows_settings_changes() {
        let store = seeded_store(&[(1, 3 * 60 * MINUTE_MS)]).await;
        let settings = Arc::new(SharedSettings::default());
        let cleanup =
            ThumbnailCleanup::new(store.clone(), Arc::new(TokioAlarms::new()), settings.clone());

        assert_eq!(cleanup.run_cleanup().await, 0);

        settings.set(Settings {
            thumbnail_ttl: ThumbnailTtl::OneHour,
            ..Settings::default()
        });
        assert_eq!(cleanup.run_cleanup().await, 1);
    }

    #[tokio::test]
    async fn test_run_cleanup_falls_back_to_default_ttl() {
        let eight_days = 8 * 24 * 60 * MINUTE_MS;
        let store = seeded_store(&[(1, eight_days), (2, 2 * 60 * MINUTE_MS)]).await;
        let cleanup = ThumbnailCleanup::new(
            store.clone(),
            Arc::new(TokioAlarms::new()),
            Arc::new(BrokenSettings),
        );

        assert_eq!(cleanup.run_cleanup().await, 1);
        assert!(store.get(TabId::new(2)).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_alarm_triggers_cleanup() {
        let store = seeded_store(&[(1, 120 * MINUTE_MS)]).await;
        let alarms = Arc::new(TokioAlarms::new());
        let cleanup = Arc::new(ThumbnailCleanup::new(
            store.clone(),
            alarms.clone(),
            one_hour_settings(),
        ));

        cleanup.initialize();
        assert!(alarms.is_scheduled(CLEANUP_ALARM_NAME));
        assert!(cleanup.is_listening());

        tokio::time::sleep(CLEANUP_DELAY + Duration::from_secs(1)).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        assert_eq!(store.count().await, 0);
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let alarms = Arc::new(TokioAlarms::new());
        let cleanup = Arc::new(ThumbnailCleanup::new(
            Arc::new(MemoryThumbnailStore::new()),
            alarms.clone(),
            Arc::new(Settings::default()),
        ));

        cleanup.initialize();
        cleanup.initialize();

        assert_eq!(alarms.names(), vec![CLEANUP_ALARM_NAME.to_string()]);
        assert!(cleanup.is_listening());
    }

    #[tokio::test]
    async fn test_shutdown() {
        let alarms = Arc::new(TokioAlarms::new());
        let cleanup = Arc::new(ThumbnailCleanup::new(
            Arc::new(MemoryThumbnailStore::new()),
            alarms.clone(),
            Arc::new(Settings::default()),
        ));
        cleanup.initialize();

        cleanup.shutdown();

        assert!(!alarms.is_scheduled(CLEANUP_ALARM_NAME));
        assert!(!cleanup.is_listening());
    }
}

//! The status cache and its background refresh task.

use crate::audit;
use crate::cache::config::{check_lifetime, CacheConfig};
use crate::cache::refresher::CacheRefresher;
use crate::core::{cache_key, EnforcementResult, StatusResult};

use futures::lock::Mutex as AsyncMutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CacheEntry {
    value: EnforcementResult,
    expires_at: Instant,
}

/// A read-through cache of decisions keyed by `name#statusType`.
///
/// Readers only hold the map lock for one lookup. Snapshots are computed
/// by a [`CacheRefresher`] outside the lock and swapped in as a whole.
/// A failed refresh keeps the previous snapshot readable for one more
/// lifetime.
///
/// # Example
///
/// ```rust,ignore
/// let cache = Arc::new(StatusCache::new(CacheConfig::default(), refresher)?);
/// cache.start();
/// if let Some(decision) = cache.get("CERN-DISK", "ReadAccess") {
///     println!("{}", decision.status);
/// }
/// ```
#[derive(Debug)]
pub struct StatusCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    config: RwLock<CacheConfig>,
    refresher: Arc<dyn CacheRefresher>,
    refresh_lock: AsyncMutex<()>,
    running: AtomicBool,
    stop_requested: AtomicBool,
    #[cfg(feature = "tokio-runtime")]
    wakeup: tokio::sync::Notify,
}

impl StatusCache {
    /// Creates an empty cache.
    ///
    /// # Errors
    ///
    /// Returns `StatusError::Configuration` if the lifetime is zero.
    pub fn new(config: CacheConfig, refresher: Arc<dyn CacheRefresher>) -> StatusResult<Self> {
        config.validate()?;
        Ok(Self {
            entries: RwLock::new(HashMap::new()),
            config: RwLock::new(config),
            refresher,
            refresh_lock: AsyncMutex::new(()),
            running: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
            #[cfg(feature = "tokio-runtime")]
            wakeup: tokio::sync::Notify::new(),
        })
    }

    /// Returns the cached decision for an element axis, if present and not
    /// expired. Never waits for a refresh.
    pub fn get(&self, name: &str, status_type: &str) -> Option<EnforcementResult> {
        let key = cache_key(name, status_type);
        let entries = self
            .entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries
            .get(&key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value.clone())
    }

    /// Drops every entry. Reads miss until the next refresh.
    pub fn reset(&self) {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
        tracing::debug!("Status cache reset");
    }

    /// Sets the lifetime, which is also the refresh period.
    ///
    /// # Errors
    ///
    /// Returns `StatusError::Configuration` for a zero lifetime.
    pub fn set_lifetime(&self, lifetime: Duration) -> StatusResult<()> {
        check_lifetime(lifetime)?;
        self.config
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .lifetime = lifetime;
        Ok(())
    }

    /// Returns the lifetime.
    pub fn lifetime(&self) -> Duration {
        self.config().lifetime
    }

    /// Returns a copy of the configuration.
    pub fn config(&self) -> CacheConfig {
        self.config
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Returns the number of entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Returns `true` if the cache holds no entry.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Recomputes every decision and installs the new snapshot.
    ///
    /// Concurrent calls are serialized. On failure the previous snapshot
    /// stays and its expiry is pushed back by one lifetime.
    pub async fn refresh_now(&self) -> StatusResult<usize> {
        let _guard = self.refresh_lock.lock().await;
        let start = Instant::now();
        let config = self.config();

        match self.refresher.refresh().await {
            Ok(snapshot) => {
                let expires_at = Instant::now() + config.lifetime + config.stale_grace;
                let mut entries = self
                    .entries
                    .write()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                entries.clear();
                entries.extend(
                    snapshot
                        .into_iter()
                        .map(|(key, value)| (key, CacheEntry { value, expires_at })),
                );
                let count = entries.len();
                drop(entries);

                audit::emit_cache_refresh(count, start.elapsed(), None);
                Ok(count)
            }
            Err(e) => {
                let count = {
                    let mut entries = self
                        .entries
                        .write()
                        .unwrap_or_else(|poisoned| poisoned.into_inner());
                    for entry in entries.values_mut() {
                        entry.expires_at += config.lifetime;
                    }
                    entries.len()
                };
                tracing::warn!(error = %e, kept = count, "Status cache refresh failed");
                audit::emit_cache_refresh(count, start.elapsed(), Some(&e.to_string()));
                Err(e)
            }
        }
    }

    /// Returns `true` while the background task is alive.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Asks the background task to stop.
    ///
    /// The task stops at once when idle. A refresh in flight completes
    /// and installs its snapshot first.
    pub fn stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
        #[cfg(feature = "tokio-runtime")]
        self.wakeup.notify_one();
        tracing::debug!("Status cache stop requested");
    }

    /// Starts the background refresh task.
    ///
    /// Returns `false` if a task is already running.
    #[cfg(feature = "tokio-runtime")]
    pub fn start(self: &Arc<Self>) -> bool {
        if self.running.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.stop_requested.store(false, Ordering::SeqCst);

        let cache = Arc::clone(self);
        tokio::spawn(async move {
            tracing::info!(lifetime_secs = cache.lifetime().as_secs_f64(), "Status cache started");

            if cache.config().refresh_on_start && !cache.stop_requested.load(Ordering::SeqCst) {
                // Failures are logged by refresh_now.
                let _ = cache.refresh_now().await;
            }

            loop {
                tokio::select! {
                    _ = tokio::time::sleep(cache.lifetime()) => {}
                    _ = cache.wakeup.notified() => {}
                }
                if cache.stop_requested.load(Ordering::SeqCst) {
                    break;
                }
                let _ = cache.refresh_now().await;
            }

            cache.running.store(false, Ordering::SeqCst);
            tracing::info!("Status cache stopped");
        });
        true
    }

    /// Starts the background refresh task (no-op without the `tokio-runtime` feature).
    #[cfg(not(feature = "tokio-runtime"))]
    pub fn start(self: &Arc<Self>) -> bool {
        tracing::warn!("Background refresh requires the tokio-runtime feature");
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{StatusError, StatusValue};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicU64;

    #[derive(Debug, Default)]
    struct CountingRefresher {
        calls: AtomicU64,
        failing: AtomicBool,
        delay_ms: AtomicU64,
    }

    #[async_trait]
    impl CacheRefresher for CountingRefresher {
        async fn refresh(&self) -> StatusResult<HashMap<String, EnforcementResult>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            let delay = self.delay_ms.load(Ordering::SeqCst);
            if delay > 0 {
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
            if self.failing.load(Ordering::SeqCst) {
                return Err(StatusError::configuration("refresh failed"));
            }
            let mut snapshot = HashMap::new();
            snapshot.insert(
                cache_key("CERN-DISK", "ReadAccess"),
                EnforcementResult::new(StatusValue::Active, format!("generation {call}")),
            );
            Ok(snapshot)
        }
    }

    fn cache(config: CacheConfig) -> (Arc<StatusCache>, Arc<CountingRefresher>) {
        let refresher = Arc::new(CountingRefresher::default());
        (
            Arc::new(StatusCache::new(config, refresher.clone()).unwrap()),
            refresher,
        )
    }

    #[tokio::test]
    async fn test_get_after_refresh_and_reset() {
        let (cache, _) = cache(CacheConfig::default());
        assert!(cache.get("CERN-DISK", "ReadAccess").is_none());

        assert_eq!(cache.refresh_now().await.unwrap(), 1);
        let hit = cache.get("CERN-DISK", "ReadAccess").unwrap();
        assert_eq!(hit.reason, "generation 1");
        assert!(cache.get("CERN-DISK", "WriteAccess").is_none());

        cache.reset();
        assert!(cache.get("CERN-DISK", "ReadAccess").is_none());
        assert!(cache.is_empty());

        cache.refresh_now().await.unwrap();
        assert_eq!(cache.get("CERN-DISK", "ReadAccess").unwrap().reason, "generation 2");
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_snapshot() {
        let (cache, refresher) = cache(CacheConfig::default());
        cache.refresh_now().await.unwrap();

        refresher.failing.store(true, Ordering::SeqCst);
        assert!(cache.refresh_now().await.is_err());
        assert_eq!(cache.get("CERN-DISK", "ReadAccess").unwrap().reason, "generation 1");
    }

    #[tokio::test]
    async fn test_expired_entries_miss() {
        let (cache, _) = cache(
            CacheConfig::new()
                .with_lifetime(Duration::from_millis(20))
                .with_stale_grace(Duration::ZERO),
        );
        cache.refresh_now().await.unwrap();
        assert!(cache.get("CERN-DISK", "ReadAccess").is_some());

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(cache.get("CERN-DISK", "ReadAccess").is_none());
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_get_does_not_wait_for_refresh() {
        let (cache, refresher) = cache(CacheConfig::default());
        cache.refresh_now().await.unwrap();
        refresher.delay_ms.store(200, Ordering::SeqCst);

        let background = Arc::clone(&cache);
        let refresh = tokio::spawn(async move { background.refresh_now().await });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let started = Instant::now();
        let hit = cache.get("CERN-DISK", "ReadAccess").unwrap();
        assert!(started.elapsed() < Duration::from_millis(100));
        assert_eq!(hit.reason, "generation 1");

        refresh.await.unwrap().unwrap();
        assert_eq!(cache.get("CERN-DISK", "ReadAccess").unwrap().reason, "generation 2");
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let (cache, refresher) = cache(CacheConfig::new().with_lifetime(Duration::from_millis(20)));
        assert!(cache.start());
        assert!(!cache.start());
        assert!(cache.is_running());

        tokio::time::sleep(Duration::from_millis(70)).await;
        assert!(refresher.calls.load(Ordering::SeqCst) >= 2);
        assert!(cache.get("CERN-DISK", "ReadAccess").is_some());

        cache.stop();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(!cache.is_running());

        let calls = refresher.calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(refresher.calls.load(Ordering::SeqCst), calls);
    }

    #[tokio::test]
    async fn test_set_lifetime() {
        let (cache, _) = cache(CacheConfig::default());
        cache.set_lifetime(Duration::from_secs(30)).unwrap();
        assert_eq!(cache.lifetime(), Duration::from_secs(30));

        assert!(cache.set_lifetime(Duration::ZERO).is_err());
        assert_eq!(cache.lifetime(), Duration::from_secs(30));
    }

    #[test]
    fn test_zero_lifetime_rejected_at_construction() {
        let refresher = Arc::new(CountingRefresher::default());
        let err = StatusCache::new(CacheConfig::new().with_lifetime(Duration::ZERO), refresher)
            .unwrap_err();
        assert!(matches!(err, StatusError::Configuration { .. }));
    }

    #[tokio::test]
    async fn test_stop_is_prompt_when_idle() {
        let (cache, refresher) = cache(
            CacheConfig::new()
                .with_lifetime(Duration::from_secs(300))
                .with_refresh_on_start(false),
        );
        assert!(cache.start());
        tokio::time::sleep(Duration::from_millis(20)).await;

        cache.stop();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!cache.is_running());
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stop_lets_refresh_in_flight_finish() {
        let (cache, refresher) = cache(CacheConfig::new().with_lifetime(Duration::from_secs(300)));
        refresher.delay_ms.store(100, Ordering::SeqCst);
        assert!(cache.start());
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);

        cache.stop();
        assert!(cache.is_running());
        assert!(cache.get("CERN-DISK", "ReadAccess").is_none());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!cache.is_running());
        assert_eq!(cache.get("CERN-DISK", "ReadAccess").unwrap().reason, "generation 1");
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
    }
}

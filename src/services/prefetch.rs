//! Background warming of the next catalog page.
//!
//! Prefetches are fire-and-forget `tokio` tasks. They are capped by a
//! semaphore, each runs under its own timeout, and a second request for an
//! offset that is already being fetched is dropped. A failed prefetch is
//! logged and never reaches the request that triggered it.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::clients::ComicSource;
use crate::config::PrefetchConfig;
use crate::services::page_cache::PageCache;

/// Why a prefetch request did not start a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
    Resident,
    InFlight,
    Saturated,
    NoRuntime,
}

impl SkipReason {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Resident => "resident",
            Self::InFlight => "in_flight",
            Self::Saturated => "saturated",
            Self::NoRuntime => "no_runtime",
        }
    }
}

/// Removes the offset from the in-flight set when the task ends, however it ends.
struct InFlightGuard {
    offset: u32,
    in_flight: Arc<Mutex<HashSet<u32>>>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.offset);
    }
}

pub struct PrefetchScheduler {
    source: Arc<dyn ComicSource>,
    cache: Arc<PageCache>,
    permits: Arc<Semaphore>,
    in_flight: Arc<Mutex<HashSet<u32>>>,
    timeout: Duration,
    enabled: bool,
}

impl PrefetchScheduler {
    #[must_use]
    pub fn new(source: Arc<dyn ComicSource>, cache: Arc<PageCache>, config: &PrefetchConfig) -> Self {
        Self {
            source,
            cache,
            permits: Arc::new(Semaphore::new(config.max_in_flight)),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            timeout: Duration::from_secs(config.timeout_seconds),
            enabled: config.enabled,
        }
    }

    /// Number of prefetches currently running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().len()
    }

    /// Starts a background fetch of `offset` unless it is already resident,
    /// already being fetched, or the concurrency cap is reached. Never blocks
    /// and never fails; the handle is returned for callers that want to await it.
    pub fn schedule_prefetch(&self, offset: u32) -> Option<JoinHandle<()>> {
        match self.try_spawn(offset) {
            Ok(handle) => {
                metrics::counter!("comic_prefetch_started_total").increment(1);
                Some(handle)
            }
            Err(reason) => {
                debug!(offset, reason = reason.as_str(), "Prefetch skipped");
                metrics::counter!("comic_prefetch_skipped_total", "reason" => reason.as_str())
                    .increment(1);
                None
            }
        }
    }

    fn try_spawn(&self, offset: u32) -> Result<JoinHandle<()>, SkipReason> {
        if !self.enabled {
            return Err(SkipReason::Disabled);
        }

        if self.cache.contains(offset) {
            return Err(SkipReason::Resident);
        }

        let runtime = tokio::runtime::Handle::try_current().map_err(|_| SkipReason::NoRuntime)?;

        if !self.in_flight.lock().insert(offset) {
            return Err(SkipReason::InFlight);
        }
        let guard = InFlightGuard {
            offset,
            in_flight: Arc::clone(&self.in_flight),
        };

        let Ok(permit) = Arc::clone(&self.permits).try_acquire_owned() else {
            drop(guard);
            return Err(SkipReason::Saturated);
        };

        let source = Arc::clone(&self.source);
        let cache = Arc::clone(&self.cache);
        let timeout = self.timeout;

        Ok(runtime.spawn(async move {
            let _permit = permit;
            let _guard = guard;

            match tokio::time::timeout(timeout, source.fetch_page(offset)).await {
                Ok(Ok(page)) => {
                    let outcome = cache.insert_if_absent(offset, Arc::new(page));
                    debug!(offset, ?outcome, "Prefetch completed");
                }
                Ok(Err(error)) => {
                    metrics::counter!("comic_prefetch_failed_total").increment(1);
                    warn!(offset, error = %error, "Prefetch failed");
                }
                Err(_) => {
                    metrics::counter!("comic_prefetch_failed_total").increment(1);
                    warn!(
                        offset,
                        timeout_secs = timeout.as_secs(),
                        "Prefetch timed out"
                    );
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::test_support::MockSource;
    use crate::models::ComicPage;

    fn scheduler(source: Arc<MockSource>, cache: Arc<PageCache>, max_in_flight: usize) -> PrefetchScheduler {
        let config = PrefetchConfig {
            enabled: true,
            max_in_flight,
            timeout_seconds: 5,
        };
        PrefetchScheduler::new(source, cache, &config)
    }

    #[tokio::test]
    async fn test_prefetch_populates_cache() {
        let source = Arc::new(MockSource::new(12));
        let cache = Arc::new(PageCache::new(3));
        let prefetcher = scheduler(source.clone(), cache.clone(), 4);

        let handle = prefetcher.schedule_prefetch(12).expect("prefetch should start");
        handle.await.unwrap();

        let page = cache.lookup(12).expect("page should be resident");
        assert_eq!(page.records.first().map(|c| c.id), Some(12));
        assert_eq!(source.call_count(), 1);
        assert_eq!(prefetcher.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_failed_prefetch_is_absorbed() {
        let source = Arc::new(MockSource::failing(12));
        let cache = Arc::new(PageCache::new(3));
        let prefetcher = scheduler(source.clone(), cache.clone(), 4);

        let handle = prefetcher.schedule_prefetch(24).unwrap();
        // The task itself completes normally; the failure is only logged.
        assert!(handle.await.is_ok());
        assert!(cache.is_empty());
        assert_eq!(prefetcher.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_resident_offset_is_not_fetched() {
        let source = Arc::new(MockSource::new(12));
        let cache = Arc::new(PageCache::new(3));
        cache.insert_if_absent(12, Arc::new(ComicPage::new(12, vec![])));
        let prefetcher = scheduler(source.clone(), cache, 4);

        assert!(prefetcher.schedule_prefetch(12).is_none());
        assert_eq!(source.call_count(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_in_flight_prefetch_is_dropped() {
        let source = Arc::new(MockSource::new(12).with_delay(Duration::from_millis(100)));
        let cache = Arc::new(PageCache::new(3));
        let prefetcher = scheduler(source.clone(), cache.clone(), 4);

        let first = prefetcher.schedule_prefetch(36).unwrap();
        assert!(prefetcher.schedule_prefetch(36).is_none());
        first.await.unwrap();

        assert_eq!(source.call_count(), 1);
        assert_eq!(cache.offsets(), vec![36]);
    }

    #[tokio::test]
    async fn test_saturated_scheduler_skips_without_blocking() {
        let source = Arc::new(MockSource::new(12).with_delay(Duration::from_millis(100)));
        let cache = Arc::new(PageCache::new(3));
        let prefetcher = scheduler(source.clone(), cache.clone(), 1);

        let first = prefetcher.schedule_prefetch(12).unwrap();
        assert!(prefetcher.schedule_prefetch(24).is_none());
        // Rejected offset is not left marked as in flight.
        assert_eq!(prefetcher.in_flight(), 1);
        first.await.unwrap();

        assert!(prefetcher.schedule_prefetch(24).is_some());
    }

    #[tokio::test]
    async fn test_prefetch_times_out() {
        let source = Arc::new(MockSource::new(12).with_delay(Duration::from_secs(3)));
        let cache = Arc::new(PageCache::new(3));
        let config = PrefetchConfig {
            enabled: true,
            max_in_flight: 2,
            timeout_seconds: 1,
        };
        let prefetcher = PrefetchScheduler::new(source, cache.clone(), &config);

        prefetcher.schedule_prefetch(48).unwrap().await.unwrap();
        assert!(cache.is_empty());
        assert_eq!(prefetcher.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_disabled_scheduler_does_nothing() {
        let source = Arc::new(MockSource::new(12));
        let config = PrefetchConfig {
            enabled: false,
            ..PrefetchConfig::default()
        };
        let prefetcher = PrefetchScheduler::new(source.clone(), Arc::new(PageCache::new(3)), &config);

        assert!(prefetcher.schedule_prefetch(12).is_none());
        assert_eq!(source.call_count(), 0);
    }

    #[test]
    fn test_schedule_outside_runtime_does_not_panic() {
        let source = Arc::new(MockSource::new(12));
        let prefetcher = scheduler(source.clone(), Arc::new(PageCache::new(3)), 2);

        assert!(prefetcher.schedule_prefetch(12).is_none());
        assert_eq!(prefetcher.in_flight(), 0);
    }
}

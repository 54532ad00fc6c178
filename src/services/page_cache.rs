//! Bounded in-memory cache of catalog pages keyed by offset.
//!
//! Eviction is strictly FIFO by insertion: a lookup never changes which entry
//! goes next. Every operation runs under a single mutex, so the existence check
//! in [`PageCache::insert_if_absent`] is atomic with respect to other inserts.
//! The lock is never held across a network call.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

use crate::models::ComicPage;

#[derive(Debug)]
struct CacheEntry {
    offset: u32,
    /// Monotonic insertion sequence.
    inserted: u64,
    page: Arc<ComicPage>,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: VecDeque<CacheEntry>,
    next_sequence: u64,
}

/// Result of [`PageCache::insert_if_absent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted { evicted: Option<u32> },
    AlreadyPresent,
}

#[derive(Debug)]
pub struct PageCache {
    capacity: usize,
    state: Mutex<CacheState>,
}

impl PageCache {
    /// # Panics
    /// Panics when `capacity` is zero; config validation rejects that earlier.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "page cache capacity must be at least 1");
        Self {
            capacity,
            state: Mutex::new(CacheState {
                entries: VecDeque::with_capacity(capacity + 1),
                next_sequence: 0,
            }),
        }
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the resident page for `offset`. Never fetches and never
    /// reorders entries.
    pub fn lookup(&self, offset: u32) -> Option<Arc<ComicPage>> {
        let page = {
            let state = self.state.lock();
            state
                .entries
                .iter()
                .find(|e| e.offset == offset)
                .map(|e| Arc::clone(&e.page))
        };

        if page.is_some() {
            metrics::counter!("comic_cache_hits_total").increment(1);
        } else {
            metrics::counter!("comic_cache_misses_total").increment(1);
        }

        page
    }

    /// Residency check without touching hit/miss counters.
    pub fn contains(&self, offset: u32) -> bool {
        self.state.lock().entries.iter().any(|e| e.offset == offset)
    }

    /// Stores `page` under `offset` unless that offset is already resident.
    /// When the insert pushes the cache over capacity, the oldest entry is
    /// evicted.
    pub fn insert_if_absent(&self, offset: u32, page: Arc<ComicPage>) -> InsertOutcome {
        let outcome = {
            let mut state = self.state.lock();

            if state.entries.iter().any(|e| e.offset == offset) {
                InsertOutcome::AlreadyPresent
            } else {
                let inserted = state.next_sequence;
                state.next_sequence += 1;
                state.entries.push_back(CacheEntry {
                    offset,
                    inserted,
                    page,
                });

                let evicted = if state.entries.len() > self.capacity {
                    state.entries.pop_front().map(|e| e.offset)
                } else {
                    None
                };

                InsertOutcome::Inserted { evicted }
            }
        };

        if let InsertOutcome::Inserted {
            evicted: Some(evicted),
        } = outcome
        {
            metrics::counter!("comic_cache_evictions_total").increment(1);
            debug!(offset, evicted, "Evicted oldest cached page");
        }

        outcome
    }

    /// Resident offsets, oldest first.
    pub fn offsets(&self) -> Vec<u32> {
        self.state.lock().entries.iter().map(|e| e.offset).collect()
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    /// Point-in-time view of the resident entries, oldest first.
    pub fn snapshot(&self) -> Vec<CachedPageInfo> {
        self.state
            .lock()
            .entries
            .iter()
            .map(|e| CachedPageInfo {
                offset: e.offset,
                inserted: e.inserted,
                records: e.page.len(),
                fetched_at: e.page.fetched_at,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CachedPageInfo {
    pub offset: u32,
    pub inserted: u64,
    pub records: usize,
    pub fetched_at: DateTime<Utc>,
}

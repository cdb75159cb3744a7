//! Bounded page cache keyed by exact URL.

use std::num::NonZeroUsize;

use lru::LruCache;
use metrics::counter;
use quire_api_types::PageData;
use tokio::time::Instant;
use tracing::debug;

pub const METRIC_CACHE_HIT: &str = "quire_navigator_cache_hit_total";
pub const METRIC_CACHE_MISS: &str = "quire_navigator_cache_miss_total";
pub const METRIC_CACHE_EVICT: &str = "quire_navigator_cache_evict_total";

/// Pages kept when no explicit bound is configured.
pub const DEFAULT_MAX_CACHE_SIZE: usize = 5;

#[derive(Debug, Clone)]
pub struct CacheItem {
    pub data: PageData,
    pub last_accessed: Instant,
}

/// LRU of fetched pages. Reads refresh recency; inserting into a full cache
/// evicts the least recently accessed entry first.
#[derive(Debug)]
pub struct PageCache {
    entries: LruCache<String, CacheItem>,
}

impl PageCache {
    /// A zero bound is clamped to one entry.
    pub fn new(max_size: usize) -> Self {
        let bound = NonZeroUsize::new(max_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(bound),
        }
    }

    pub fn max_size(&self) -> usize {
        self.entries.cap().get()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up `url` and marks it most recently used.
    pub fn get(&mut self, url: &str) -> Option<&PageData> {
        match self.entries.get_mut(url) {
            Some(item) => {
                item.last_accessed = Instant::now();
                counter!(METRIC_CACHE_HIT).increment(1);
                Some(&item.data)
            }
            None => {
                counter!(METRIC_CACHE_MISS).increment(1);
                None
            }
        }
    }

    /// Presence check that leaves recency untouched.
    pub fn contains(&self, url: &str) -> bool {
        self.entries.contains(url)
    }

    pub fn insert(&mut self, url: impl Into<String>, data: PageData) {
        let url = url.into();
        if !self.entries.contains(&url) && self.entries.len() >= self.max_size() {
            if let Some((evicted, _)) = self.entries.pop_lru() {
                counter!(METRIC_CACHE_EVICT).increment(1);
                debug!(
                    target = "quire_navigator::cache",
                    evicted = %evicted,
                    "Evicted least recently used page"
                );
            }
        }

        self.entries.put(
            url,
            CacheItem {
                data,
                last_accessed: Instant::now(),
            },
        );
    }

    pub fn last_accessed(&self, url: &str) -> Option<Instant> {
        self.entries.peek(url).map(|item| item.last_accessed)
    }

    /// Cached URLs from most to least recently used.
    pub fn urls(&self) -> Vec<&str> {
        self.entries.iter().map(|(url, _)| url.as_str()).collect()
    }
}

impl Default for PageCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CACHE_SIZE)
    }
}

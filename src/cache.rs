//! In-memory tile cache with LRU eviction.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Error;
use crate::job::JobKey;

/// Counters describing how the cache has been used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
    pub evictions: u64,
}

struct CacheEntry<B> {
    bitmap: Arc<B>,
    last_used: u64,
}

struct CacheInner<B> {
    entries: HashMap<JobKey, CacheEntry<B>>,
    // Monotonic access counter used for LRU ordering
    clock: u64,
    stats: CacheStats,
}

impl<B> CacheInner<B> {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn evict_lru(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(key, _)| *key);

        if let Some(key) = oldest {
            self.entries.remove(&key);
            self.stats.evictions += 1;
        }
    }
}

/// A bounded map from job fingerprints to rendered bitmaps.
///
/// Bitmaps are shared with callers through [`Arc`], so an evicted bitmap stays alive for as
/// long as someone is still reading it.
pub struct TileCache<B> {
    capacity: usize,
    inner: Mutex<CacheInner<B>>,
}

impl<B> TileCache<B> {
    pub fn new(capacity: usize) -> Result<TileCache<B>, Error> {
        if capacity == 0 {
            return Err(Error::InvalidCacheCapacity);
        }

        Ok(TileCache {
            capacity,
            inner: Mutex::new(CacheInner {
                entries: HashMap::with_capacity(capacity),
                clock: 0,
                stats: CacheStats::default(),
            }),
        })
    }

    /// Looks up a bitmap, marking it as recently used.
    pub fn get(&self, key: &JobKey) -> Option<Arc<B>> {
        let mut inner = self.inner.lock();
        let now = inner.tick();

        let found = inner.entries.get_mut(key).map(|entry| {
            entry.last_used = now;
            Arc::clone(&entry.bitmap)
        });

        match found {
            Some(_) => inner.stats.hits += 1,
            None => inner.stats.misses += 1,
        }

        found
    }

    /// Stores a bitmap, evicting the least recently used entry if the cache is full.
    pub fn put(&self, key: JobKey, bitmap: Arc<B>) {
        let mut inner = self.inner.lock();
        let now = inner.tick();

        if !inner.entries.contains_key(&key) && inner.entries.len() >= self.capacity {
            inner.evict_lru();
        }

        inner.entries.insert(
            key,
            CacheEntry {
                bitmap,
                last_used: now,
            },
        );
        inner.stats.insertions += 1;
    }

    /// Checks for a key without touching its recency or the statistics.
    pub fn contains(&self, key: &JobKey) -> bool {
        self.inner.lock().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats
    }
}

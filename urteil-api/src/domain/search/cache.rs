//! Time-boxed, capacity-bounded cache for search result lists.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::types::SearchResult;

/// Counters and sizing information for the result cache.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Hit percentage with one decimal; 0 when no lookups happened yet.
    pub hit_rate: f64,
    pub size: usize,
    pub max_size: usize,
}

struct CacheEntry {
    results: Vec<SearchResult>,
    inserted_at: Instant,
    last_access: Instant,
}

struct Inner {
    entries: HashMap<String, CacheEntry>,
    hits: u64,
    misses: u64,
}

/// Maps canonical query keys to stored result lists.
///
/// Entries expire `ttl` after insertion (checked lazily on access) and the
/// least-recently-accessed entry is evicted when a new key arrives at
/// capacity. Entries are whole-unit: a stored list is never partially
/// updated, only replaced.
///
/// Both lookup-with-expiry and insert-with-eviction are read-modify-write
/// sequences, so all state sits behind one mutex; concurrent searches only
/// contend for the short critical sections.
pub struct ResultCache {
    inner: Mutex<Inner>,
    max_size: usize,
    ttl: Duration,
}

impl ResultCache {
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                hits: 0,
                misses: 0,
            }),
            max_size,
            ttl,
        }
    }

    /// Look up a stored result list, counting the access as hit or miss.
    /// An entry past its TTL is removed and reported as a miss.
    pub fn get(&self, key: &str) -> Option<Vec<SearchResult>> {
        let mut guard = self.inner.lock().unwrap();
        let inner = &mut *guard;

        if let Some(entry) = inner.entries.get_mut(key) {
            if entry.inserted_at.elapsed() < self.ttl {
                entry.last_access = Instant::now();
                let results = entry.results.clone();
                inner.hits += 1;
                return Some(results);
            }
            inner.entries.remove(key);
        }

        inner.misses += 1;
        None
    }

    /// Store a result list, evicting the entry with the oldest last access
    /// when a new key would exceed capacity. Linear scan — fine at the
    /// configured capacity of a few dozen entries.
    pub fn put(&self, key: String, results: &[SearchResult]) {
        let mut inner = self.inner.lock().unwrap();

        if inner.entries.len() >= self.max_size && !inner.entries.contains_key(&key) {
            if let Some(oldest) = inner
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_access)
                .map(|(key, _)| key.clone())
            {
                inner.entries.remove(&oldest);
            }
        }

        let now = Instant::now();
        inner.entries.insert(
            key,
            CacheEntry {
                results: results.to_vec(),
                inserted_at: now,
                last_access: now,
            },
        );
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().unwrap();
        let lookups = inner.hits + inner.misses;
        let hit_rate = if lookups > 0 {
            (inner.hits as f64 / lookups as f64 * 1000.0).round() / 10.0
        } else {
            0.0
        };

        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            hit_rate,
            size: inner.entries.len(),
            max_size: self.max_size,
        }
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.entries.clear();
    }
}

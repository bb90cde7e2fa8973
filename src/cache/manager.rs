//! Typed analysis cache on top of a [`SessionStore`].

use super::backend::{MemoryStore, SessionStore};
use super::key::CacheKey;
use crate::types::AnalysisResult;
use crate::Result;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub errors: u64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Default)]
struct AtomicStats {
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    errors: AtomicU64,
}

impl AtomicStats {
    fn to_stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Session cache of analysis results, JSON-encoded into the store.
///
/// No TTL and no size bound: entries live as long as the store does.
/// Clones share the store and the statistics.
#[derive(Clone)]
pub struct AnalysisCache {
    store: Arc<dyn SessionStore>,
    stats: Arc<AtomicStats>,
}

impl AnalysisCache {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            stats: Arc::new(AtomicStats::default()),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Cached result for `key`. An undecodable stored value counts as a miss.
    pub fn get(&self, key: &CacheKey) -> Option<AnalysisResult> {
        let Some(raw) = self.store.get(key.as_str()) else {
            self.stats.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        };
        match serde_json::from_str(&raw) {
            Ok(result) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                debug!(%key, "cache hit");
                Some(result)
            }
            Err(e) => {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                warn!(%key, error = %e, "ignoring undecodable cache entry");
                None
            }
        }
    }

    pub fn put(&self, key: &CacheKey, result: &AnalysisResult) -> Result<()> {
        let raw = serde_json::to_string(result)?;
        self.store.put(key.as_str(), raw);
        self.stats.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn clear(&self) {
        self.store.clear();
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.to_stats()
    }

    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }
}

impl Default for AnalysisCache {
    fn default() -> Self {
        Self::in_memory()
    }
}

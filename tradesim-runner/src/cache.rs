//! Bounded TTL cache of loaded bar series, keyed by (symbol, timeframe).
//!
//! Owned by the caller and passed by reference into the service, so runs that
//! share a symbol load it once. Loading happens outside the lock; two runs
//! racing on a cold key may both load, and the later insert wins. When full,
//! the least recently used series is evicted.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use lru::LruCache;
use tracing::debug;
use tradesim_core::domain::{BarSeries, Timeframe};

use crate::data_loader::{BarSource, LoadError};

type Key = (String, Timeframe);

struct Entry {
    series: Arc<BarSeries>,
    loaded_at: Instant,
}

pub struct SeriesCache {
    ttl: Duration,
    entries: Mutex<LruCache<Key, Entry>>,
}

impl SeriesCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            ttl,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Fresh cached series, if any. Expired entries are dropped.
    pub fn get(&self, symbol: &str, timeframe: Timeframe) -> Option<Arc<BarSeries>> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let key = (symbol.to_string(), timeframe);
        let fresh = entries.get(&key)?.loaded_at.elapsed() < self.ttl;
        if !fresh {
            entries.pop(&key);
            return None;
        }
        entries.get(&key).map(|e| Arc::clone(&e.series))
    }

    /// Cached series, or load from `source` and cache it.
    pub fn get_or_load(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        source: &dyn BarSource,
    ) -> Result<Arc<BarSeries>, LoadError> {
        if let Some(series) = self.get(symbol, timeframe) {
            debug!(symbol, %timeframe, "series cache hit");
            return Ok(series);
        }
        let series = Arc::new(source.load(symbol, timeframe)?);
        debug!(symbol, %timeframe, source = source.name(), bars = series.len(), "series cache fill");
        self.insert(symbol, timeframe, Arc::clone(&series));
        Ok(series)
    }

    fn insert(&self, symbol: &str, timeframe: Timeframe, series: Arc<BarSeries>) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = Entry {
            series,
            loaded_at: Instant::now(),
        };
        if let Some(((evicted, tf), _)) = entries.push((symbol.to_string(), timeframe), entry) {
            if evicted != symbol || tf != timeframe {
                debug!(symbol = %evicted, timeframe = %tf, "series cache eviction");
            }
        }
    }

    pub fn invalidate(&self, symbol: &str, timeframe: Timeframe) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.pop(&(symbol.to_string(), timeframe));
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SeriesCache {
    /// One hour, 64 series.
    fn default() -> Self {
        Self::new(Duration::from_secs(3600), 64)
    }
}

//! Indicator snapshots: the indicator values visible as of one bar.
//!
//! The simulation precomputes every indicator series once (`IndicatorPanel`)
//! and reads snapshots by index. `compute_snapshot` recomputes from the
//! truncated history and is the reference the panel is tested against.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::IndicatorKey;
use crate::domain::Bar;

/// Result of looking an indicator up in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorReading {
    Value(f64),
    /// Warm-up not yet satisfied, or the indicator was not computed.
    Absent,
}

impl IndicatorReading {
    pub fn value(self) -> Option<f64> {
        match self {
            IndicatorReading::Value(v) => Some(v),
            IndicatorReading::Absent => None,
        }
    }
}

/// Indicator values as of one bar. Only indicators with a value are present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndicatorSnapshot {
    values: BTreeMap<IndicatorKey, f64>,
}

impl IndicatorSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value; NaN and infinite values are treated as absent.
    pub fn insert(&mut self, key: IndicatorKey, value: f64) {
        if value.is_finite() {
            self.values.insert(key, value);
        }
    }

    pub fn get(&self, key: IndicatorKey) -> IndicatorReading {
        match self.values.get(&key) {
            Some(&v) => IndicatorReading::Value(v),
            None => IndicatorReading::Absent,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (IndicatorKey, f64)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }
}

/// Every requested indicator series, precomputed over a full bar history.
#[derive(Debug, Clone)]
pub struct IndicatorPanel {
    series: BTreeMap<IndicatorKey, Vec<f64>>,
    len: usize,
}

impl IndicatorPanel {
    /// Compute the catalog plus any `extra` keys over `bars`.
    pub fn compute(bars: &[Bar], extra: &[IndicatorKey]) -> Self {
        let keys: BTreeSet<IndicatorKey> = IndicatorKey::catalog()
            .into_iter()
            .chain(extra.iter().copied())
            .collect();

        let mut series = BTreeMap::new();
        for key in keys {
            let values = key.indicator().compute(bars);
            debug_assert_eq!(
                values.len(),
                bars.len(),
                "indicator '{key}' produced {} values for {} bars",
                values.len(),
                bars.len()
            );
            series.insert(key, values);
        }

        Self {
            series,
            len: bars.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn keys(&self) -> impl Iterator<Item = IndicatorKey> + '_ {
        self.series.keys().copied()
    }

    /// Single value lookup without building a snapshot.
    pub fn value(&self, key: IndicatorKey, index: usize) -> IndicatorReading {
        match self.series.get(&key).and_then(|s| s.get(index)) {
            Some(&v) if v.is_finite() => IndicatorReading::Value(v),
            _ => IndicatorReading::Absent,
        }
    }

    /// Snapshot of every computed indicator at `index`.
    pub fn snapshot(&self, index: usize) -> IndicatorSnapshot {
        let mut snap = IndicatorSnapshot::new();
        for (key, values) in &self.series {
            if let Some(&v) = values.get(index) {
                snap.insert(*key, v);
            }
        }
        snap
    }
}

/// Catalog snapshot at `index`, computed from `bars[..=index]` only.
///
/// Returns an empty snapshot when `index` is out of range.
pub fn compute_snapshot(bars: &[Bar], index: usize) -> IndicatorSnapshot {
    match bars.get(..=index) {
        Some(history) => IndicatorPanel::compute(history, &[]).snapshot(index),
        None => IndicatorSnapshot::new(),
    }
}

/// Largest lookback among `keys` (0 when empty).
pub fn max_lookback(keys: &[IndicatorKey]) -> usize {
    keys.iter().map(|k| k.lookback()).max().unwrap_or(0)
}

//! Bar and BarSeries: the fundamental market data units.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::timeframe::Timeframe;

/// OHLCV bar for a single symbol over one interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Calendar date of the bar (UTC).
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    /// Basic OHLCV sanity check: finite, non-negative, high >= low.
    pub fn is_sane(&self) -> bool {
        let fields = [self.open, self.high, self.low, self.close, self.volume];
        if fields.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return false;
        }
        self.high >= self.low
    }
}

/// Errors raised while assembling a bar series.
#[derive(Debug, Error, PartialEq)]
pub enum BarError {
    #[error("bar {index} has non-finite or negative values, or high < low")]
    InvalidBar { index: usize },

    #[error("bar {index} timestamp {timestamp} is not after the previous bar")]
    NonIncreasingTimestamp {
        index: usize,
        timestamp: DateTime<Utc>,
    },
}

/// Ordered, immutable OHLCV sequence for one symbol and one interval.
///
/// Timestamps are strictly increasing. Gaps (missing sessions) are tolerated
/// and never repaired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    symbol: String,
    timeframe: Timeframe,
    bars: Vec<Bar>,
}

impl BarSeries {
    pub fn new(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        bars: Vec<Bar>,
    ) -> Result<Self, BarError> {
        for (index, bar) in bars.iter().enumerate() {
            if !bar.is_sane() {
                return Err(BarError::InvalidBar { index });
            }
            if index > 0 && bar.timestamp <= bars[index - 1].timestamp {
                return Err(BarError::NonIncreasingTimestamp {
                    index,
                    timestamp: bar.timestamp,
                });
            }
        }
        Ok(Self {
            symbol: symbol.into(),
            timeframe,
            bars,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Bars whose calendar date lies in `[start, end]`, as a new series.
    pub fn slice_range(&self, start: NaiveDate, end: NaiveDate) -> BarSeries {
        let bars = self
            .bars
            .iter()
            .filter(|b| {
                let d = b.date();
                d >= start && d <= end
            })
            .copied()
            .collect();
        BarSeries {
            symbol: self.symbol.clone(),
            timeframe: self.timeframe,
            bars,
        }
    }

    /// BLAKE3 digest over every timestamp and OHLCV value.
    pub fn content_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.symbol.as_bytes());
        hasher.update(self.timeframe.as_str().as_bytes());
        for bar in &self.bars {
            hasher.update(&bar.timestamp.timestamp_millis().to_le_bytes());
            hasher.update(&bar.open.to_le_bytes());
            hasher.update(&bar.high.to_le_bytes());
            hasher.update(&bar.low.to_le_bytes());
            hasher.update(&bar.close.to_le_bytes());
            hasher.update(&bar.volume.to_le_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }
}

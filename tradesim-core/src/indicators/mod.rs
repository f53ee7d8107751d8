//! Technical indicators and the per-bar indicator snapshot.
//!
//! Every indicator is a causal function of the bar history: bar series in,
//! numeric series of the same length out, `f64::NAN` where the warm-up window
//! is not yet satisfied. The value at index `t` never depends on bars after `t`.
//!
//! Multi-output indicators (Bollinger, MACD, Stochastic) are exposed as separate
//! instances per output, keeping the single-series `Indicator` trait.

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod key;
pub mod macd;
pub mod price;
pub mod rsi;
pub mod sma;
pub mod snapshot;
pub mod stochastic;

pub use adx::Adx;
pub use atr::Atr;
pub use bollinger::{Bollinger, BollingerBand};
pub use ema::Ema;
pub use key::{IndicatorKey, ParseIndicatorError, MAX_PERIOD};
pub use macd::{Macd, MacdOutput};
pub use price::{PriceField, PriceSeries};
pub use rsi::Rsi;
pub use sma::Sma;
pub use snapshot::{
    compute_snapshot, max_lookback, IndicatorPanel, IndicatorReading, IndicatorSnapshot,
};
pub use stochastic::{Stochastic, StochasticLine};

use crate::domain::Bar;

/// Trait for indicators.
///
/// # Look-ahead contamination guard
/// No indicator value at bar t may depend on price data from bar t+1 or later.
/// Every indicator must pass the truncated-vs-full series test.
pub trait Indicator: Send + Sync {
    /// Canonical name (e.g., "SMA_20", "ATR_14").
    fn name(&self) -> String;

    /// Index of the first bar that can carry a value.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    ///
    /// Returns a `Vec<f64>` of the same length as `bars`.
    /// The first `lookback()` values are `f64::NAN`.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Create synthetic bars from close prices for testing.
///
/// open = prev_close (or close for first bar), high = max(open,close) + 1.0,
/// low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    use chrono::{Duration, TimeZone, Utc};
    let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar::new(
                base + Duration::days(i as i64),
                open,
                open.max(close) + 1.0,
                (open.min(close) - 1.0).max(0.0),
                close,
                1000.0,
            )
        })
        .collect()
}

/// Create bars from explicit (open, high, low, close) tuples for testing.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
    use chrono::{Duration, TimeZone, Utc};
    let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| {
            Bar::new(base + Duration::days(i as i64), open, high, low, close, 1000.0)
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

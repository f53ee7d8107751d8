//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * close[t] + (1 - alpha) * EMA[t-1], alpha = 2/(period+1).
//! Seed: SMA of the first `period` valid values.
//! Lookback: period - 1.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self { period }
    }
}

impl Indicator for Ema {
    fn name(&self) -> String {
        format!("EMA_{}", self.period)
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        ema_of_series(&closes, self.period)
    }
}

/// EMA of an arbitrary series.
///
/// Leading NaNs are skipped: the seed is the mean of the first `period`
/// values after them, which lets composed indicators (MACD signal line)
/// smooth a series that itself has a warm-up. A NaN after the seed taints
/// every later value.
pub fn ema_of_series(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 {
        return result;
    }

    let start = match values.iter().position(|v| !v.is_nan()) {
        Some(s) => s,
        None => return result,
    };
    let seed_end = start + period;
    if seed_end > n {
        return result;
    }

    let window = &values[start..seed_end];
    if window.iter().any(|v| v.is_nan()) {
        return result;
    }
    let seed = window.iter().sum::<f64>() / period as f64;
    result[seed_end - 1] = seed;

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut prev = seed;
    for i in seed_end..n {
        if values[i].is_nan() {
            return result;
        }
        let ema = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = ema;
        prev = ema;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn ema_period_1_equals_close() {
        let bars = make_bars(&[100.0, 200.0, 300.0]);
        let result = Ema::new(1).compute(&bars);
        assert_approx(result[0], 100.0, DEFAULT_EPSILON);
        assert_approx(result[1], 200.0, DEFAULT_EPSILON);
        assert_approx(result[2], 300.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_3_known_values() {
        // alpha = 0.5, seed at index 2 = SMA(10,11,12) = 11
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let result = Ema::new(3).compute(&bars);

        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_approx(result[2], 11.0, DEFAULT_EPSILON);
        assert_approx(result[3], 12.0, DEFAULT_EPSILON);
        assert_approx(result[4], 13.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_of_series_skips_leading_nan() {
        let values = [f64::NAN, f64::NAN, 10.0, 11.0, 12.0, 13.0];
        let result = ema_of_series(&values, 3);
        assert!(result[3].is_nan());
        assert_approx(result[4], 11.0, DEFAULT_EPSILON);
        assert_approx(result[5], 12.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_nan_after_seed_propagates() {
        let values = [10.0, 11.0, 12.0, f64::NAN, 14.0];
        let result = ema_of_series(&values, 3);
        assert_approx(result[2], 11.0, DEFAULT_EPSILON);
        assert!(result[3].is_nan());
        assert!(result[4].is_nan());
    }

    #[test]
    fn ema_lookback() {
        assert_eq!(Ema::new(20).lookback(), 19);
        assert_eq!(Ema::new(1).lookback(), 0);
    }
}

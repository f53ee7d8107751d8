//! Stochastic oscillator.
//!
//! %K = 100 * (close - lowest_low) / (highest_high - lowest_low) over `k_period`
//! bars; 50 when the range is flat. %D = SMA(%K, d_period).
//! Lookback: k_period - 1 for %K, k_period + d_period - 2 for %D.

use super::sma::sma_of_series;
use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StochasticLine {
    K,
    D,
}

#[derive(Debug, Clone)]
pub struct Stochastic {
    k_period: usize,
    d_period: usize,
    line: StochasticLine,
}

impl Stochastic {
    pub fn new(k_period: usize, d_period: usize, line: StochasticLine) -> Self {
        assert!(k_period >= 1 && d_period >= 1, "Stochastic periods must be >= 1");
        Self {
            k_period,
            d_period,
            line,
        }
    }

    fn percent_k(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut k = vec![f64::NAN; n];
        if n < self.k_period {
            return k;
        }
        for i in (self.k_period - 1)..n {
            let window = &bars[i + 1 - self.k_period..=i];
            let highest = window.iter().map(|b| b.high).fold(f64::MIN, f64::max);
            let lowest = window.iter().map(|b| b.low).fold(f64::MAX, f64::min);
            let range = highest - lowest;
            k[i] = if range == 0.0 {
                50.0
            } else {
                100.0 * (bars[i].close - lowest) / range
            };
        }
        k
    }
}

impl Indicator for Stochastic {
    fn name(&self) -> String {
        match self.line {
            StochasticLine::K => format!("STOCH_K_{}", self.k_period),
            StochasticLine::D => format!("STOCH_D_{}_{}", self.k_period, self.d_period),
        }
    }

    fn lookback(&self) -> usize {
        match self.line {
            StochasticLine::K => self.k_period.saturating_sub(1),
            StochasticLine::D => self.k_period.saturating_add(self.d_period).saturating_sub(2),
        }
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let k = self.percent_k(bars);
        match self.line {
            StochasticLine::K => k,
            StochasticLine::D => sma_of_series(&k, self.d_period),
        }
    }
}

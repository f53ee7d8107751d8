//! MACD: EMA(fast) - EMA(slow), its EMA signal line, and the histogram.
//!
//! Lookback: slow - 1 for the line, slow + signal - 2 for signal and histogram.

use super::ema::ema_of_series;
use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdOutput {
    Line,
    Signal,
    Histogram,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    output: MacdOutput,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize, output: MacdOutput) -> Self {
        assert!(fast >= 1 && signal >= 1, "MACD periods must be >= 1");
        assert!(slow > fast, "MACD slow period must exceed fast period");
        Self {
            fast,
            slow,
            signal,
            output,
        }
    }
}

impl Indicator for Macd {
    fn name(&self) -> String {
        let prefix = match self.output {
            MacdOutput::Line => "MACD",
            MacdOutput::Signal => "MACD_SIGNAL",
            MacdOutput::Histogram => "MACD_HIST",
        };
        format!("{prefix}_{}_{}_{}", self.fast, self.slow, self.signal)
    }

    fn lookback(&self) -> usize {
        match self.output {
            MacdOutput::Line => self.slow.saturating_sub(1),
            MacdOutput::Signal | MacdOutput::Histogram => {
                self.slow.saturating_add(self.signal).saturating_sub(2)
            }
        }
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let fast = ema_of_series(&closes, self.fast);
        let slow = ema_of_series(&closes, self.slow);
        // NaN - x stays NaN, so the line inherits the slow warm-up.
        let line: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
        if self.output == MacdOutput::Line {
            return line;
        }

        let signal = ema_of_series(&line, self.signal);
        match self.output {
            MacdOutput::Signal => signal,
            _ => line.iter().zip(&signal).map(|(l, s)| l - s).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars};

    fn ramp(n: usize) -> Vec<Bar> {
        let closes: Vec<f64> = (0..n).map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0).collect();
        make_bars(&closes)
    }

    #[test]
    fn first_values_at_lookback() {
        let bars = ramp(60);
        for output in [MacdOutput::Line, MacdOutput::Signal, MacdOutput::Histogram] {
            let macd = Macd::new(12, 26, 9, output);
            let values = macd.compute(&bars);
            assert!(values[macd.lookback() - 1].is_nan(), "{output:?}");
            assert!(!values[macd.lookback()].is_nan(), "{output:?}");
        }
    }

    #[test]
    fn histogram_is_line_minus_signal() {
        let bars = ramp(60);
        let line = Macd::new(12, 26, 9, MacdOutput::Line).compute(&bars);
        let signal = Macd::new(12, 26, 9, MacdOutput::Signal).compute(&bars);
        let hist = Macd::new(12, 26, 9, MacdOutput::Histogram).compute(&bars);
        for i in 33..60 {
            assert_approx(hist[i], line[i] - signal[i], 1e-12);
        }
    }

    #[test]
    fn flat_series_is_zero() {
        let bars = make_bars(&[42.0; 40]);
        let line = Macd::new(12, 26, 9, MacdOutput::Line).compute(&bars);
        assert_approx(line[39], 0.0, 1e-12);
    }

    #[test]
    fn lookbacks() {
        assert_eq!(Macd::new(12, 26, 9, MacdOutput::Line).lookback(), 25);
        assert_eq!(Macd::new(12, 26, 9, MacdOutput::Signal).lookback(), 33);
    }
}

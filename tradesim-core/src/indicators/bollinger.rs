//! Bollinger Bands: moving average +/- standard deviation multiplier.
//!
//! Each output is a separate Indicator instance:
//! - Middle: SMA(close, period)
//! - Upper / Lower: middle +/- mult * stddev(close, period)
//! - Width: (upper - lower) / middle
//!
//! Population stddev (divide by N). Lookback: period - 1.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BollingerBand {
    Upper,
    Middle,
    Lower,
    Width,
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    multiplier: f64,
    band: BollingerBand,
}

impl Bollinger {
    pub fn new(period: usize, multiplier: f64, band: BollingerBand) -> Self {
        assert!(period >= 1, "Bollinger period must be >= 1");
        Self {
            period,
            multiplier,
            band,
        }
    }
}

impl Indicator for Bollinger {
    fn name(&self) -> String {
        let band = match self.band {
            BollingerBand::Upper => "UPPER",
            BollingerBand::Middle => "MIDDLE",
            BollingerBand::Lower => "LOWER",
            BollingerBand::Width => "WIDTH",
        };
        format!("BB_{band}_{}_{}", self.period, self.multiplier)
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];

        if n < self.period {
            return result;
        }

        for i in (self.period - 1)..n {
            let window = &bars[i + 1 - self.period..=i];
            let mean = window.iter().map(|b| b.close).sum::<f64>() / self.period as f64;
            let variance = window
                .iter()
                .map(|b| {
                    let diff = b.close - mean;
                    diff * diff
                })
                .sum::<f64>()
                / self.period as f64;
            let offset = self.multiplier * variance.sqrt();

            result[i] = match self.band {
                BollingerBand::Middle => mean,
                BollingerBand::Upper => mean + offset,
                BollingerBand::Lower => mean - offset,
                BollingerBand::Width => {
                    if mean == 0.0 {
                        f64::NAN
                    } else {
                        (2.0 * offset) / mean
                    }
                }
            };
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn bands_on_known_window() {
        // closes 2,4,4,4,5,5,7,9: mean 5, population stddev 2
        let bars = make_bars(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        let upper = Bollinger::new(8, 2.0, BollingerBand::Upper).compute(&bars);
        let middle = Bollinger::new(8, 2.0, BollingerBand::Middle).compute(&bars);
        let lower = Bollinger::new(8, 2.0, BollingerBand::Lower).compute(&bars);
        let width = Bollinger::new(8, 2.0, BollingerBand::Width).compute(&bars);

        assert!(upper[6].is_nan());
        assert_approx(middle[7], 5.0, DEFAULT_EPSILON);
        assert_approx(upper[7], 9.0, DEFAULT_EPSILON);
        assert_approx(lower[7], 1.0, DEFAULT_EPSILON);
        assert_approx(width[7], 8.0 / 5.0, DEFAULT_EPSILON);
    }

    #[test]
    fn flat_series_collapses_bands() {
        let bars = make_bars(&[50.0; 25]);
        let upper = Bollinger::new(20, 2.0, BollingerBand::Upper).compute(&bars);
        let lower = Bollinger::new(20, 2.0, BollingerBand::Lower).compute(&bars);
        assert_approx(upper[24], 50.0, DEFAULT_EPSILON);
        assert_approx(lower[24], 50.0, DEFAULT_EPSILON);
    }

    #[test]
    fn lookback() {
        assert_eq!(Bollinger::new(20, 2.0, BollingerBand::Upper).lookback(), 19);
    }
}

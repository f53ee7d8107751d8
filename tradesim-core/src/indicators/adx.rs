//! ADX, Average Directional Index (Wilder).
//!
//! 1. +DM / -DM from consecutive bars
//! 2. Wilder-smooth +DM, -DM and TR
//! 3. +DI, -DI, then DX = 100 * |+DI - -DI| / (+DI + -DI)
//! 4. ADX = Wilder-smoothed DX
//!
//! Lookback: 2 * period - 1.

use super::atr::{true_range, wilder_smooth};
use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Adx {
    period: usize,
}

impl Adx {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ADX period must be >= 1");
        Self { period }
    }
}

impl Indicator for Adx {
    fn name(&self) -> String {
        format!("ADX_{}", self.period)
    }

    fn lookback(&self) -> usize {
        self.period.saturating_mul(2).saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        if n < 2 {
            return vec![f64::NAN; n];
        }

        let mut plus_dm = vec![f64::NAN; n];
        let mut minus_dm = vec![f64::NAN; n];
        for i in 1..n {
            let up = bars[i].high - bars[i - 1].high;
            let down = bars[i - 1].low - bars[i].low;
            plus_dm[i] = if up > down && up > 0.0 { up } else { 0.0 };
            minus_dm[i] = if down > up && down > 0.0 { down } else { 0.0 };
        }

        let mut tr = true_range(bars);
        tr[0] = f64::NAN;
        let smooth_tr = wilder_smooth(&tr, self.period);
        let smooth_plus = wilder_smooth(&plus_dm, self.period);
        let smooth_minus = wilder_smooth(&minus_dm, self.period);

        let mut dx = vec![f64::NAN; n];
        for i in 0..n {
            if smooth_tr[i].is_nan() || smooth_plus[i].is_nan() || smooth_minus[i].is_nan() {
                continue;
            }
            if smooth_tr[i] == 0.0 {
                dx[i] = 0.0;
                continue;
            }
            let plus_di = 100.0 * smooth_plus[i] / smooth_tr[i];
            let minus_di = 100.0 * smooth_minus[i] / smooth_tr[i];
            let di_sum = plus_di + minus_di;
            dx[i] = if di_sum == 0.0 {
                0.0
            } else {
                100.0 * (plus_di - minus_di).abs() / di_sum
            };
        }

        wilder_smooth(&dx, self.period)
    }
}

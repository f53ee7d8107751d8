//! "Kelly" sizer.
//!
//! This is not the Kelly criterion. A true Kelly fraction needs the strategy's
//! win/loss distribution, which is not known mid-run, so the policy commits a
//! flat `KELLY_FALLBACK_FRACTION` of available capital.

use super::Sizer;

pub const KELLY_FALLBACK_FRACTION: f64 = 0.02;

#[derive(Debug, Clone, Copy, Default)]
pub struct KellySizer;

impl Sizer for KellySizer {
    fn dollars(&self, available_capital: f64, _price: f64, _volatility: Option<f64>) -> f64 {
        available_capital * KELLY_FALLBACK_FRACTION
    }

    fn name(&self) -> &str {
        "Kelly"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sizers::size;

    #[test]
    fn flat_two_percent() {
        assert_eq!(size(&KellySizer, 50_000.0, 20.0, Some(3.0)), 1_000.0);
    }
}

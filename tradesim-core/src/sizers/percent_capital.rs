//! Percent-of-capital sizer.

use super::Sizer;

#[derive(Debug, Clone)]
pub struct PercentCapitalSizer {
    /// Percent of available capital, e.g. 10.0 for 10%.
    pct: f64,
}

impl PercentCapitalSizer {
    pub fn new(pct: f64) -> Self {
        Self { pct }
    }
}

impl Sizer for PercentCapitalSizer {
    fn dollars(&self, available_capital: f64, _price: f64, _volatility: Option<f64>) -> f64 {
        available_capital * self.pct / 100.0
    }

    fn name(&self) -> &str {
        "PercentCapital"
    }
}

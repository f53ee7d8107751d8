//! Volatility (ATR risk) sizer.
//!
//! Risk a fixed fraction of capital per trade with the stop assumed
//! `atr_multiplier` ATRs away:
//!
//! ```text
//! risk_dollars   = capital * risk_fraction
//! risk_per_share = atr_multiplier * ATR
//! shares         = floor(risk_dollars / risk_per_share)
//! ```
//!
//! Example: $100,000 capital, 2% risk ($2,000), ATR $2.50, 2x multiplier
//! ($5.00 per share) gives 400 shares.

use super::Sizer;

#[derive(Debug, Clone)]
pub struct VolatilitySizer {
    risk_fraction: f64,
    atr_multiplier: f64,
}

impl VolatilitySizer {
    pub fn new(risk_fraction: f64, atr_multiplier: f64) -> Self {
        Self {
            risk_fraction,
            atr_multiplier,
        }
    }
}

impl Default for VolatilitySizer {
    fn default() -> Self {
        Self::new(0.02, 2.0)
    }
}

impl Sizer for VolatilitySizer {
    fn dollars(&self, available_capital: f64, price: f64, volatility: Option<f64>) -> f64 {
        let Some(atr) = volatility.filter(|a| *a > 0.0) else {
            return 0.0;
        };
        let risk_per_share = self.atr_multiplier * atr;
        let shares = (available_capital * self.risk_fraction / risk_per_share).floor();
        shares * price
    }

    fn name(&self) -> &str {
        "Volatility"
    }
}

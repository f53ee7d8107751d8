//! Cost model: slippage and commission.
//!
//! Slippage is directional: buyers pay more, sellers receive less.
//! Commission is a percent of notional, charged on each side.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CostModel {
    /// Slippage in percent of price, e.g. 0.05 for 5 bps.
    pub slippage_pct: f64,
    /// Commission in percent of notional per side.
    pub commission_pct: f64,
}

impl CostModel {
    pub fn new(slippage_pct: f64, commission_pct: f64) -> Self {
        Self {
            slippage_pct,
            commission_pct,
        }
    }

    pub fn frictionless() -> Self {
        Self::default()
    }

    /// Buy fill price after slippage.
    pub fn buy_price(&self, raw_price: f64) -> f64 {
        raw_price * (1.0 + self.slippage_pct / 100.0)
    }

    /// Sell fill price after slippage.
    pub fn sell_price(&self, raw_price: f64) -> f64 {
        raw_price * (1.0 - self.slippage_pct / 100.0)
    }

    /// Dollar slippage paid on a fill: |fill - raw| * shares.
    pub fn slippage_cost(&self, raw_price: f64, fill_price: f64, shares: f64) -> f64 {
        (fill_price - raw_price).abs() * shares
    }

    /// `commission = price * shares * commission_pct / 100`
    pub fn commission(&self, price: f64, shares: f64) -> f64 {
        price * shares * self.commission_pct / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slippage_is_directional() {
        let costs = CostModel::new(1.0, 0.0);
        assert!((costs.buy_price(100.0) - 101.0).abs() < 1e-12);
        assert!((costs.sell_price(100.0) - 99.0).abs() < 1e-12);
        assert!((costs.slippage_cost(100.0, 101.0, 10.0) - 10.0).abs() < 1e-12);
    }

    #[test]
    fn commission_on_notional() {
        let costs = CostModel::new(0.0, 0.1);
        assert!((costs.commission(50.0, 200.0) - 10.0).abs() < 1e-12);
    }

    #[test]
    fn frictionless_is_identity() {
        let costs = CostModel::frictionless();
        assert_eq!(costs.buy_price(42.0), 42.0);
        assert_eq!(costs.commission(42.0, 10.0), 0.0);
    }
}

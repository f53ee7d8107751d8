//! Position sizers: turn a sizing policy, available capital and current
//! volatility into a dollar amount, then a whole share count.
//!
//! Every policy is capped at `MAX_CAPITAL_FRACTION` of available capital so the
//! entry commission can never overdraw cash.

pub mod fixed;
pub mod kelly;
pub mod percent_capital;
pub mod volatility;

pub use fixed::FixedSizer;
pub use kelly::KellySizer;
pub use percent_capital::PercentCapitalSizer;
pub use volatility::VolatilitySizer;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest share of available capital a single entry may use.
pub const MAX_CAPITAL_FRACTION: f64 = 0.95;

/// Position sizing logic.
///
/// Sizers do not decide entry or exit, and do not apply the capital cap;
/// `size` does that for every implementation.
pub trait Sizer: Send + Sync {
    /// Uncapped dollar amount for a new position.
    ///
    /// `volatility` is the current ATR_14, absent during its warm-up.
    fn dollars(&self, available_capital: f64, price: f64, volatility: Option<f64>) -> f64;

    /// Sizer name for logging.
    fn name(&self) -> &str;
}

/// Capped dollar amount for a new position.
pub fn size(
    sizer: &dyn Sizer,
    available_capital: f64,
    price: f64,
    volatility: Option<f64>,
) -> f64 {
    if available_capital <= 0.0 || price <= 0.0 {
        return 0.0;
    }
    let raw = sizer.dollars(available_capital, price, volatility);
    if !raw.is_finite() || raw <= 0.0 {
        return 0.0;
    }
    raw.min(available_capital * MAX_CAPITAL_FRACTION)
}

/// Relative slack when flooring a share count, so `k * price / price` stays `k`.
const SHARE_EPSILON: f64 = 1e-9;

/// Whole shares purchasable with `dollars` at `price`.
pub fn shares_for(dollars: f64, price: f64) -> f64 {
    if price <= 0.0 || dollars <= 0.0 {
        return 0.0;
    }
    let raw = dollars / price;
    let nearest = raw.round();
    if nearest > 0.0 && (raw - nearest).abs() <= SHARE_EPSILON * nearest {
        nearest
    } else {
        raw.floor()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SizingMethod {
    Fixed,
    PercentCapital,
    Kelly,
    Volatility,
}

impl fmt::Display for SizingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SizingMethod::Fixed => "FIXED",
            SizingMethod::PercentCapital => "PERCENT_CAPITAL",
            SizingMethod::Kelly => "KELLY",
            SizingMethod::Volatility => "VOLATILITY",
        };
        f.write_str(s)
    }
}

/// Sizing method plus its numeric parameter.
///
/// `FIXED` reads the parameter as dollars, `PERCENT_CAPITAL` as a percent.
/// `KELLY` and `VOLATILITY` use fixed risk constants and ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizingPolicy {
    pub method: SizingMethod,
    #[serde(default)]
    pub parameter: f64,
}

impl SizingPolicy {
    pub fn fixed(amount: f64) -> Self {
        Self {
            method: SizingMethod::Fixed,
            parameter: amount,
        }
    }

    pub fn percent_capital(pct: f64) -> Self {
        Self {
            method: SizingMethod::PercentCapital,
            parameter: pct,
        }
    }

    pub fn kelly() -> Self {
        Self {
            method: SizingMethod::Kelly,
            parameter: 0.0,
        }
    }

    pub fn volatility() -> Self {
        Self {
            method: SizingMethod::Volatility,
            parameter: 0.0,
        }
    }

    pub fn sizer(&self) -> Box<dyn Sizer> {
        match self.method {
            SizingMethod::Fixed => Box::new(FixedSizer::new(self.parameter)),
            SizingMethod::PercentCapital => Box::new(PercentCapitalSizer::new(self.parameter)),
            SizingMethod::Kelly => Box::new(KellySizer),
            SizingMethod::Volatility => Box::new(VolatilitySizer::default()),
        }
    }

    /// Whether the policy reads ATR_14.
    pub fn needs_volatility(&self) -> bool {
        self.method == SizingMethod::Volatility
    }
}

impl fmt::Display for SizingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.method {
            SizingMethod::Fixed | SizingMethod::PercentCapital => {
                write!(f, "{}({})", self.method, self.parameter)
            }
            _ => write!(f, "{}", self.method),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Greedy;

    impl Sizer for Greedy {
        fn dollars(&self, available_capital: f64, _price: f64, _vol: Option<f64>) -> f64 {
            available_capital * 2.0
        }

        fn name(&self) -> &str {
            "greedy"
        }
    }

    #[test]
    fn size_is_capped_at_95_percent() {
        assert_eq!(size(&Greedy, 10_000.0, 50.0, None), 9_500.0);
    }

    #[test]
    fn size_zero_without_capital() {
        assert_eq!(size(&Greedy, 0.0, 50.0, None), 0.0);
        assert_eq!(size(&Greedy, -5.0, 50.0, None), 0.0);
    }

    #[test]
    fn shares_are_floored() {
        assert_eq!(shares_for(1_000.0, 33.0), 30.0);
        assert_eq!(shares_for(10.0, 33.0), 0.0);
        assert_eq!(shares_for(10.0, 0.0), 0.0);
        assert_eq!(shares_for(999.0, 10.0), 99.0);
    }

    #[test]
    fn shares_survive_float_round_off() {
        let price = 10.275134999999999;
        assert_eq!(shares_for(200.0 * price, price), 200.0);
        for k in 1..500 {
            let price = 3.0 + k as f64 * 0.137_913;
            assert_eq!(shares_for(k as f64 * price, price), k as f64, "price {price}");
        }
    }

    #[test]
    fn policy_parses_from_toml_shape() {
        let policy: SizingPolicy =
            serde_json::from_str(r#"{"method":"PERCENT_CAPITAL","parameter":10}"#).unwrap();
        assert_eq!(policy, SizingPolicy::percent_capital(10.0));
        let kelly: SizingPolicy = serde_json::from_str(r#"{"method":"KELLY"}"#).unwrap();
        assert_eq!(kelly.method, SizingMethod::Kelly);
        assert_eq!(kelly.to_string(), "KELLY");
    }

    #[test]
    fn only_volatility_needs_atr() {
        assert!(SizingPolicy::volatility().needs_volatility());
        assert!(!SizingPolicy::kelly().needs_volatility());
    }
}

//! Fixed dollar sizer: the same notional on every entry, whatever the capital.

use super::Sizer;

#[derive(Debug, Clone)]
pub struct FixedSizer {
    amount: f64,
}

impl FixedSizer {
    pub fn new(amount: f64) -> Self {
        Self { amount }
    }
}

impl Sizer for FixedSizer {
    fn dollars(&self, _available_capital: f64, _price: f64, _volatility: Option<f64>) -> f64 {
        self.amount
    }

    fn name(&self) -> &str {
        "Fixed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sizers::{shares_for, size};

    #[test]
    fn fixed_amount_regardless_of_capital() {
        let sizer = FixedSizer::new(2_500.0);
        assert_eq!(size(&sizer, 10_000.0, 100.0, None), 2_500.0);
        assert_eq!(size(&sizer, 100_000.0, 100.0, None), 2_500.0);
    }

    #[test]
    fn fixed_amount_still_capped() {
        let sizer = FixedSizer::new(5_000.0);
        let dollars = size(&sizer, 4_000.0, 100.0, None);
        assert_eq!(dollars, 3_800.0);
        assert_eq!(shares_for(dollars, 100.0), 38.0);
    }
}

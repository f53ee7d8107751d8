//! Raw bar fields exposed as indicator series (CLOSE, VOLUME).

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceField {
    Close,
    Volume,
}

#[derive(Debug, Clone)]
pub struct PriceSeries {
    field: PriceField,
}

impl PriceSeries {
    pub fn new(field: PriceField) -> Self {
        Self { field }
    }
}

impl Indicator for PriceSeries {
    fn name(&self) -> String {
        match self.field {
            PriceField::Close => "CLOSE".into(),
            PriceField::Volume => "VOLUME".into(),
        }
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        bars.iter()
            .map(|b| match self.field {
                PriceField::Close => b.close,
                PriceField::Volume => b.volume,
            })
            .collect()
    }
}

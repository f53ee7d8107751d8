//! Strategy condition: `indicator operator comparand`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::indicators::IndicatorKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "<=")]
    LessOrEqual,
    /// Equal within `EQUALITY_EPSILON`.
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = "CROSS_ABOVE", alias = "crosses_above")]
    CrossAbove,
    #[serde(rename = "CROSS_BELOW", alias = "crosses_below")]
    CrossBelow,
}

impl Operator {
    /// Operators that compare against the previous snapshot.
    pub fn needs_previous(&self) -> bool {
        matches!(self, Operator::CrossAbove | Operator::CrossBelow)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operator::GreaterThan => ">",
            Operator::LessThan => "<",
            Operator::GreaterOrEqual => ">=",
            Operator::LessOrEqual => "<=",
            Operator::Equal => "==",
            Operator::CrossAbove => "CROSS_ABOVE",
            Operator::CrossBelow => "CROSS_BELOW",
        };
        f.write_str(s)
    }
}

/// Right-hand side of a condition: a literal, or another indicator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Comparand {
    Value(f64),
    Indicator(IndicatorKey),
}

impl From<f64> for Comparand {
    fn from(v: f64) -> Self {
        Comparand::Value(v)
    }
}

impl From<IndicatorKey> for Comparand {
    fn from(key: IndicatorKey) -> Self {
        Comparand::Indicator(key)
    }
}

impl fmt::Display for Comparand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparand::Value(v) => write!(f, "{v}"),
            Comparand::Indicator(key) => write!(f, "{key}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub indicator: IndicatorKey,
    pub operator: Operator,
    #[serde(rename = "value")]
    pub comparand: Comparand,
}

impl Condition {
    pub fn new(indicator: IndicatorKey, operator: Operator, comparand: impl Into<Comparand>) -> Self {
        Self {
            indicator,
            operator,
            comparand: comparand.into(),
        }
    }

    /// Every indicator this condition reads.
    pub fn keys(&self) -> impl Iterator<Item = IndicatorKey> {
        let other = match self.comparand {
            Comparand::Indicator(key) => Some(key),
            Comparand::Value(_) => None,
        };
        std::iter::once(self.indicator).chain(other)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.indicator, self.operator, self.comparand)
    }
}

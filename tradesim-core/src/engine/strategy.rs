//! Strategy definition: rules, sizing, exits and costs for one run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::indicators::{IndicatorKey, MAX_PERIOD};
use crate::lifecycle::CostModel;
use crate::rules::Condition;
use crate::sizers::{SizingMethod, SizingPolicy};

/// Invalid strategy field.
#[derive(Debug, Error, PartialEq)]
pub enum StrategyError {
    #[error("initial_capital must be positive, got {0}")]
    NonPositiveCapital(f64),

    #[error("{field} must be a non-negative number, got {value}")]
    NegativePercent { field: &'static str, value: f64 },

    #[error("max_positions must be at least 1")]
    ZeroMaxPositions,

    #[error("sizing parameter for {method} must be positive, got {value}")]
    InvalidSizingParameter { method: SizingMethod, value: f64 },

    #[error("indicator {0} period must be between 1 and {max}", max = MAX_PERIOD)]
    InvalidPeriod(IndicatorKey),
}

fn default_max_positions() -> usize {
    1
}

/// Immutable once a run starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyDefinition {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// AND-combined.
    #[serde(default)]
    pub entry_conditions: Vec<Condition>,
    /// AND-combined.
    #[serde(default)]
    pub exit_conditions: Vec<Condition>,
    pub sizing: SizingPolicy,
    #[serde(default)]
    pub stop_loss_pct: Option<f64>,
    #[serde(default)]
    pub take_profit_pct: Option<f64>,
    #[serde(default = "default_max_positions")]
    pub max_positions: usize,
    #[serde(default)]
    pub commission_pct: f64,
    #[serde(default)]
    pub slippage_pct: f64,
    pub initial_capital: f64,
}

impl StrategyDefinition {
    pub fn validate(&self) -> Result<(), StrategyError> {
        if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
            return Err(StrategyError::NonPositiveCapital(self.initial_capital));
        }
        let percents = [
            ("commission_pct", Some(self.commission_pct)),
            ("slippage_pct", Some(self.slippage_pct)),
            ("stop_loss_pct", self.stop_loss_pct),
            ("take_profit_pct", self.take_profit_pct),
        ];
        for (field, value) in percents {
            if let Some(value) = value.filter(|v| !(v.is_finite() && *v >= 0.0)) {
                return Err(StrategyError::NegativePercent { field, value });
            }
        }
        if self.max_positions == 0 {
            return Err(StrategyError::ZeroMaxPositions);
        }
        let needs_parameter = matches!(
            self.sizing.method,
            SizingMethod::Fixed | SizingMethod::PercentCapital
        );
        if needs_parameter && !(self.sizing.parameter.is_finite() && self.sizing.parameter > 0.0) {
            return Err(StrategyError::InvalidSizingParameter {
                method: self.sizing.method,
                value: self.sizing.parameter,
            });
        }
        let out_of_range = self
            .referenced_indicators()
            .into_iter()
            .find(|k| k.period().is_some_and(|p| p == 0 || p > MAX_PERIOD));
        if let Some(key) = out_of_range {
            return Err(StrategyError::InvalidPeriod(key));
        }
        Ok(())
    }

    pub fn cost_model(&self) -> CostModel {
        CostModel::new(self.slippage_pct, self.commission_pct)
    }

    /// Every indicator read by the rules or the sizer.
    pub fn referenced_indicators(&self) -> Vec<IndicatorKey> {
        let mut keys: BTreeSet<IndicatorKey> = self
            .entry_conditions
            .iter()
            .chain(&self.exit_conditions)
            .flat_map(|c| c.keys())
            .collect();
        if self.sizing.needs_volatility() {
            keys.insert(IndicatorKey::Atr(14));
        }
        keys.into_iter().collect()
    }
}

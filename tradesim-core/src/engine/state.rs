//! Engine configuration, errors, and run result types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::strategy::StrategyError;
use crate::domain::{EquityPoint, Trade};

/// The longest standard warm-up: a 200-period moving average.
pub const MIN_BARS: usize = 200;

/// Configuration for a single simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Minimum usable bars; shorter series fail with `InsufficientData`.
    pub min_bars: usize,
    /// Explicit warm-up; the loop starts at the larger of this and the
    /// strategy's indicator lookback.
    pub warmup_bars: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_bars: MIN_BARS,
            warmup_bars: None,
        }
    }
}

impl EngineConfig {
    pub fn with_warmup(warmup_bars: usize) -> Self {
        Self {
            warmup_bars: Some(warmup_bars),
            ..Self::default()
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("insufficient historical data: {bars} bars available, {required} required")]
    InsufficientData { bars: usize, required: usize },

    #[error("invalid strategy: {0}")]
    InvalidStrategy(#[from] StrategyError),

    #[error("cancelled")]
    Cancelled,
}

/// Everything one simulation produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub symbol: String,
    pub initial_capital: f64,
    pub final_equity: f64,
    /// Closed trades in exit order.
    pub trades: Vec<Trade>,
    /// One point per simulated bar.
    pub equity_curve: Vec<EquityPoint>,
    /// Index of the first simulated bar.
    pub warmup_index: usize,
    pub bar_count: usize,
}

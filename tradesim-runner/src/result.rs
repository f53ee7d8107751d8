//! Completed-run summary: metrics, equity curve, monthly returns and the
//! audited trade list.

use serde::{Deserialize, Serialize};
use tradesim_core::domain::{EquityPoint, Trade};
use tradesim_core::SimulationResult;

use crate::metrics::{monthly_returns, MonthlyReturn, PerformanceMetrics};

/// Current schema version for persisted summaries.
pub const SCHEMA_VERSION: u32 = 1;

/// Everything persisted for a COMPLETED run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSummary {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub metrics: PerformanceMetrics,
    pub equity_curve: Vec<EquityPoint>,
    pub monthly_returns: Vec<MonthlyReturn>,
    pub trades: Vec<Trade>,
    pub initial_capital: f64,
    /// First simulated bar.
    pub warmup_index: usize,
    pub bar_count: usize,
    /// BLAKE3 over the simulated series.
    pub dataset_hash: String,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl ResultSummary {
    pub fn from_simulation(result: SimulationResult, dataset_hash: impl Into<String>) -> Self {
        let metrics = PerformanceMetrics::compute(
            &result.trades,
            &result.equity_curve,
            result.initial_capital,
        );
        Self {
            schema_version: SCHEMA_VERSION,
            metrics,
            monthly_returns: monthly_returns(&result.equity_curve),
            equity_curve: result.equity_curve,
            trades: result.trades,
            initial_capital: result.initial_capital,
            warmup_index: result.warmup_index,
            bar_count: result.bar_count,
            dataset_hash: dataset_hash.into(),
        }
    }
}

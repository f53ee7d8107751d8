//! Backtest service: turns a request into a persisted run record.
//!
//! Every request is recorded RUNNING before any work happens, then moves to
//! COMPLETED with the full result summary or FAILED with the error's
//! `Display` text stored verbatim. Independent requests can run in parallel
//! through `run_batch`; each simulation owns its own ledger, so the only
//! shared state is the series cache and the stores.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use tradesim_core::domain::Timeframe;
use tradesim_core::engine::{simulate_with_cancel, EngineConfig, EngineError};

use crate::cache::SeriesCache;
use crate::config::ConfigError;
use crate::data_loader::{BarSource, LoadError};
use crate::result::ResultSummary;
use crate::store::{BacktestRun, DateRange, RunId, RunStore, StoreError};
use crate::strategy_store::StrategyStore;

/// Errors from the runner. The `Display` text is what a FAILED run stores.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("strategy not found: {0}")]
    StrategyNotFound(String),

    #[error("no historical data available for symbol {symbol}")]
    NoData { symbol: String },

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("strategy store error: {0}")]
    Strategy(#[from] ConfigError),

    #[error(transparent)]
    Load(LoadError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<LoadError> for RunError {
    fn from(e: LoadError) -> Self {
        match e {
            LoadError::NoData { symbol } => RunError::NoData { symbol },
            other => RunError::Load(other),
        }
    }
}

/// One backtest request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestRequest {
    pub strategy_id: String,
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default = "default_timeframe")]
    pub timeframe: Timeframe,
}

fn default_timeframe() -> Timeframe {
    Timeframe::Day1
}

impl BacktestRequest {
    pub fn new(
        strategy_id: impl Into<String>,
        symbol: impl Into<String>,
        start: NaiveDate,
        end: NaiveDate,
        timeframe: Timeframe,
    ) -> Self {
        Self {
            strategy_id: strategy_id.into(),
            symbol: symbol.into(),
            start,
            end,
            timeframe,
        }
    }
}

/// Wires the stores, the bar source and the cache to the engine.
pub struct BacktestService<'a> {
    strategies: &'a dyn StrategyStore,
    source: &'a dyn BarSource,
    cache: &'a SeriesCache,
    runs: &'a dyn RunStore,
    config: EngineConfig,
    sequence: AtomicU64,
    cancel: AtomicBool,
}

impl<'a> BacktestService<'a> {
    pub fn new(
        strategies: &'a dyn StrategyStore,
        source: &'a dyn BarSource,
        cache: &'a SeriesCache,
        runs: &'a dyn RunStore,
    ) -> Self {
        Self {
            strategies,
            source,
            cache,
            runs,
            config: EngineConfig::default(),
            sequence: AtomicU64::new(0),
            cancel: AtomicBool::new(false),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Ask in-flight simulations to stop at their next bar. Runs that stop
    /// are recorded FAILED with message `cancelled`.
    ///
    /// The flag stays set, so runs submitted afterwards are cancelled too
    /// until `reset_cancel` is called.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Clear a previous `cancel` so new runs execute again.
    pub fn reset_cancel(&self) {
        self.cancel.store(false, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Run one backtest and persist its outcome.
    ///
    /// On failure the run is already FAILED in the store when the error is
    /// returned. Store errors on the RUNNING insert are returned without a
    /// record.
    pub fn run_backtest(
        &self,
        strategy_id: &str,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        timeframe: Timeframe,
    ) -> Result<RunId, RunError> {
        let range = DateRange::new(start, end);
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let id = RunId::derive(strategy_id, symbol, &range, timeframe, sequence);
        let run = BacktestRun::running(id.clone(), strategy_id, symbol, range, timeframe);
        self.runs.create_running(&run)?;
        info!(run = %id, strategy = strategy_id, symbol, %start, %end, %timeframe, "backtest started");

        match self.execute(strategy_id, symbol, range, timeframe) {
            Ok(summary) => {
                let trades = summary.metrics.total_trades;
                let return_pct = summary.metrics.total_return_pct;
                self.runs.complete(&id, summary)?;
                info!(run = %id, trades, return_pct, "backtest completed");
                Ok(id)
            }
            Err(e) => {
                let message = e.to_string();
                warn!(run = %id, error = %message, "backtest failed");
                self.runs.fail(&id, &message)?;
                Err(e)
            }
        }
    }

    /// Run independent requests in parallel. Results are in request order.
    pub fn run_batch(&self, requests: &[BacktestRequest]) -> Vec<Result<RunId, RunError>> {
        info!(requests = requests.len(), "batch started");
        requests
            .par_iter()
            .map(|r| self.run_backtest(&r.strategy_id, &r.symbol, r.start, r.end, r.timeframe))
            .collect()
    }

    fn execute(
        &self,
        strategy_id: &str,
        symbol: &str,
        range: DateRange,
        timeframe: Timeframe,
    ) -> Result<ResultSummary, RunError> {
        let strategy = self
            .strategies
            .get(strategy_id)?
            .ok_or_else(|| RunError::StrategyNotFound(strategy_id.to_string()))?;

        let full = self.cache.get_or_load(symbol, timeframe, self.source)?;
        let series = full.slice_range(range.start, range.end);
        if series.is_empty() {
            return Err(RunError::NoData {
                symbol: symbol.to_string(),
            });
        }

        let dataset_hash = series.content_hash();
        let result = simulate_with_cancel(&series, &strategy, &self.config, &self.cancel)?;
        Ok(ResultSummary::from_simulation(result, dataset_hash))
    }
}

//! TradeSim Runner: everything around the engine.
//!
//! This crate builds on `tradesim-core` to provide:
//! - Performance metrics and the persisted result summary
//! - TOML backtest configuration and strategy stores
//! - Bar loading (CSV, Parquet, synthetic) behind a TTL series cache
//! - Run records with crash recovery
//! - The backtest service and parallel batch runs
//! - CSV / JSON export and logging setup

pub mod cache;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod logging;
pub mod metrics;
pub mod result;
pub mod runner;
pub mod store;
pub mod strategy_store;

pub use cache::SeriesCache;
pub use config::{BacktestConfig, BacktestSection, ConfigError};
pub use data_loader::{BarSource, DataDirSource, FileSource, LoadError, SyntheticSource};
pub use logging::{init_logging, LogFormat};
pub use metrics::{MonthlyReturn, PerformanceMetrics};
pub use result::ResultSummary;
pub use runner::{BacktestRequest, BacktestService, RunError};
pub use store::{
    BacktestRun, DateRange, InMemoryRunStore, JsonRunStore, RunId, RunStatus, RunStore,
    StoreError,
};
pub use strategy_store::{DirStrategyStore, InMemoryStrategyStore, StrategyStore};

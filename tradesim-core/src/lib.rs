//! TradeSim Core: the deterministic backtesting engine.
//!
//! - Domain types (bars, series, positions, trades, equity points)
//! - Indicator calculator with typed keys and per-bar snapshots
//! - Rule evaluator (AND-combined conditions, crosses, tolerance equality)
//! - Position sizers capped at 95% of available capital
//! - Position lifecycle with stop / target / signal exits and settlement
//! - Bar-by-bar simulation loop

pub mod domain;
pub mod engine;
pub mod indicators;
pub mod lifecycle;
pub mod rules;
pub mod sizers;

pub use domain::{Bar, BarSeries, EquityPoint, ExitReason, Timeframe, Trade};
pub use engine::{
    simulate, simulate_with_cancel, EngineConfig, EngineError, SimulationResult,
    StrategyDefinition,
};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: results cross threads in batch runs.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<BarSeries>();
        require_sync::<BarSeries>();
        require_send::<StrategyDefinition>();
        require_sync::<StrategyDefinition>();
        require_send::<SimulationResult>();
        require_sync::<SimulationResult>();
        require_send::<indicators::IndicatorPanel>();
        require_sync::<indicators::IndicatorPanel>();
        require_send::<EngineError>();
        require_sync::<EngineError>();
    }
}

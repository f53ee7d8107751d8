//! Simulation orchestrator: strategy definition, warm-up, and the bar loop.

pub mod loop_runner;
pub mod state;
pub mod strategy;
pub mod warmup;

pub use loop_runner::{simulate, simulate_with_cancel};
pub use state::{EngineConfig, EngineError, SimulationResult, MIN_BARS};
pub use strategy::{StrategyDefinition, StrategyError};
pub use warmup::warmup_index;

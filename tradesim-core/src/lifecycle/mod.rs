//! Position lifecycle: opening, per-bar exit checks, and settlement.

pub mod cost_model;
pub mod manager;

pub use cost_model::CostModel;
pub use manager::{settle, step, BarContext, ExitFill, PositionManager};

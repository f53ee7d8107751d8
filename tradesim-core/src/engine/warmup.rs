//! Warm-up index: the first bar the loop simulates.

use super::state::EngineConfig;
use super::strategy::StrategyDefinition;
use crate::indicators::max_lookback;

/// Largest lookback among the strategy's indicators, or the configured
/// warm-up if larger.
pub fn warmup_index(strategy: &StrategyDefinition, config: &EngineConfig) -> usize {
    let indicator_warmup = max_lookback(&strategy.referenced_indicators());
    config.warmup_bars.unwrap_or(0).max(indicator_warmup)
}

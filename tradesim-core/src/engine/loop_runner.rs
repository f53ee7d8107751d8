//! Bar-by-bar simulation loop.
//!
//! For each bar from the warm-up index to the end of the series:
//! 1. Read the precomputed indicator snapshot for the bar
//! 2. Manage open positions (stop, target, pending exit signal)
//! 3. Fill the entry signalled on the previous bar at this bar's open
//! 4. Evaluate exit and entry rules on the closed bar
//! 5. Mark to market and append an equity point
//!
//! Rules only ever see snapshots of closed bars and fills happen on the
//! following bar, so no decision depends on prices it could not have known.
//! On the final bar every remaining position is closed at the last close.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};

use super::state::{EngineConfig, EngineError, SimulationResult};
use super::strategy::StrategyDefinition;
use super::warmup::warmup_index;
use crate::domain::{BarSeries, EquityPoint, Trade};
use crate::indicators::{IndicatorKey, IndicatorPanel, IndicatorSnapshot};
use crate::lifecycle::{BarContext, PositionManager};
use crate::rules::matches_all;
use crate::sizers::{shares_for, size};

/// Run a simulation to completion.
pub fn simulate(
    series: &BarSeries,
    strategy: &StrategyDefinition,
    config: &EngineConfig,
) -> Result<SimulationResult, EngineError> {
    simulate_with_cancel(series, strategy, config, &AtomicBool::new(false))
}

/// Run a simulation, checking `cancel` once per bar.
pub fn simulate_with_cancel(
    series: &BarSeries,
    strategy: &StrategyDefinition,
    config: &EngineConfig,
    cancel: &AtomicBool,
) -> Result<SimulationResult, EngineError> {
    strategy.validate()?;

    let bars = series.bars();
    let n = bars.len();
    if n < config.min_bars {
        return Err(EngineError::InsufficientData {
            bars: n,
            required: config.min_bars,
        });
    }
    let warmup = warmup_index(strategy, config);
    if warmup >= n {
        return Err(EngineError::InsufficientData {
            bars: n,
            required: warmup.saturating_add(1),
        });
    }

    let panel = IndicatorPanel::compute(bars, &strategy.referenced_indicators());
    let sizer = strategy.sizing.sizer();
    let mut manager = PositionManager::new(
        series.symbol(),
        strategy.initial_capital,
        strategy.cost_model(),
        strategy.stop_loss_pct,
        strategy.take_profit_pct,
    );

    let last = n - 1;
    let mut trades: Vec<Trade> = Vec::new();
    let mut equity_curve = Vec::with_capacity(n - warmup);
    let mut previous: Option<IndicatorSnapshot> = None;
    // Snapshot of the bar whose close triggered a not-yet-filled entry.
    let mut pending_entry: Option<IndicatorSnapshot> = None;

    debug!(
        symbol = series.symbol(),
        strategy = %strategy.id,
        bars = n,
        warmup,
        sizer = sizer.name(),
        "simulation started"
    );

    for (t, bar) in bars.iter().enumerate().skip(warmup) {
        if cancel.load(Ordering::Relaxed) {
            info!(symbol = series.symbol(), bar = t, "simulation cancelled");
            return Err(EngineError::Cancelled);
        }

        let snapshot = panel.snapshot(t);
        let ctx = BarContext {
            index: t,
            bar,
            snapshot: &snapshot,
        };

        trades.extend(manager.manage_bar(&ctx));

        if let Some(decision) = pending_entry.take() {
            if t < last && manager.open_count() < strategy.max_positions {
                let price = manager.costs().buy_price(bar.open);
                let volatility = decision.get(IndicatorKey::Atr(14)).value();
                let dollars = size(sizer.as_ref(), manager.cash(), price, volatility);
                manager.enter(&ctx, shares_for(dollars, price), decision);
            }
        }

        if t == last {
            trades.extend(manager.close_all(&ctx));
        } else {
            let prev = previous.as_ref();
            if manager.open_count() > 0 && matches_all(&strategy.exit_conditions, &snapshot, prev) {
                manager.signal_exits(&snapshot);
            }
            if manager.open_count() < strategy.max_positions
                && matches_all(&strategy.entry_conditions, &snapshot, prev)
            {
                pending_entry = Some(snapshot.clone());
            }
        }

        let equity = manager.equity(bar.close);
        debug_assert!(
            (equity - ledger_equity(strategy.initial_capital, &trades, &manager, bar.close)).abs()
                < 1e-6 * strategy.initial_capital.max(1.0),
            "capital conservation violated at bar {t}"
        );
        equity_curve.push(EquityPoint::new(bar.timestamp, equity));
        previous = Some(snapshot);
    }

    let final_equity = equity_curve
        .last()
        .map_or(strategy.initial_capital, |p| p.equity);

    info!(
        symbol = series.symbol(),
        strategy = %strategy.id,
        trades = trades.len(),
        final_equity,
        "simulation complete"
    );

    Ok(SimulationResult {
        symbol: series.symbol().to_string(),
        initial_capital: strategy.initial_capital,
        final_equity,
        trades,
        equity_curve,
        warmup_index: warmup,
        bar_count: n,
    })
}

/// Equity rebuilt from realized P&L and open positions' unrealized P&L net
/// of their entry commission.
fn ledger_equity(
    initial_capital: f64,
    trades: &[Trade],
    manager: &PositionManager,
    close: f64,
) -> f64 {
    let realized: f64 = trades.iter().map(|t| t.net_pnl).sum();
    let open: f64 = manager
        .open_positions()
        .iter()
        .map(|p| p.market_value(close) - p.reserved())
        .sum();
    initial_capital + realized + open
}

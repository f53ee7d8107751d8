//! Performance metrics: pure functions that compute strategy statistics.
//!
//! Every metric is a pure function: equity curve and/or trade list in, scalar out.
//! Degenerate inputs (no trades, no losers, flat equity) resolve to 0, never
//! NaN or infinity, so every stored summary is fully defined.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tradesim_core::domain::{EquityPoint, Trade};

/// Bars per year used to annualize per-bar ratios.
pub const PERIODS_PER_YEAR: f64 = 252.0;

/// Aggregate performance metrics for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Fraction of trades with positive net P&L.
    pub win_rate: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    /// `|Σ winning P&L / Σ losing P&L|`; 0 when there are no losing trades.
    pub profit_factor: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub avg_bars_held: f64,
    /// Peak-to-trough decline of the equity curve, in percent (positive).
    pub max_drawdown_pct: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub expectancy: f64,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
    pub total_commission: f64,
    pub total_slippage: f64,
    pub avg_mae: f64,
    pub avg_mfe: f64,
    pub total_return_pct: f64,
    pub final_equity: f64,
}

impl PerformanceMetrics {
    /// Compute all metrics from a trade list and equity curve.
    pub fn compute(trades: &[Trade], equity_curve: &[EquityPoint], initial_capital: f64) -> Self {
        let equity: Vec<f64> = equity_curve.iter().map(|p| p.equity).collect();
        let final_equity = equity.last().copied().unwrap_or(initial_capital);
        let total_return_pct = if initial_capital > 0.0 {
            (final_equity - initial_capital) / initial_capital * 100.0
        } else {
            0.0
        };

        Self {
            total_trades: trades.len(),
            winning_trades: trades.iter().filter(|t| t.is_winner()).count(),
            losing_trades: trades.iter().filter(|t| t.is_loser()).count(),
            win_rate: win_rate(trades),
            avg_win: avg_win(trades),
            avg_loss: avg_loss(trades),
            profit_factor: profit_factor(trades),
            largest_win: largest_win(trades),
            largest_loss: largest_loss(trades),
            avg_bars_held: mean_f64(&trades.iter().map(|t| t.bars_held as f64).collect::<Vec<_>>()),
            max_drawdown_pct: max_drawdown_pct(&equity),
            sharpe_ratio: sharpe_ratio(&equity),
            sortino_ratio: sortino_ratio(&equity),
            expectancy: expectancy(trades),
            max_consecutive_wins: max_consecutive(trades, Trade::is_winner),
            max_consecutive_losses: max_consecutive(trades, Trade::is_loser),
            total_commission: trades.iter().map(|t| t.commission).sum(),
            total_slippage: trades.iter().map(|t| t.slippage).sum(),
            avg_mae: mean_f64(&trades.iter().map(|t| t.mae).collect::<Vec<_>>()),
            avg_mfe: mean_f64(&trades.iter().map(|t| t.mfe).collect::<Vec<_>>()),
            total_return_pct,
            final_equity,
        }
    }
}

/// Sum of per-bar returns for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReturn {
    /// `YYYY-MM`.
    pub month: String,
    /// Percent.
    pub return_pct: f64,
}

// ─── Trade statistics ───────────────────────────────────────────────

/// Win rate: fraction of trades that were winners.
pub fn win_rate(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64
}

/// Mean net P&L of winning trades.
pub fn avg_win(trades: &[Trade]) -> f64 {
    let wins: Vec<f64> = trades
        .iter()
        .filter(|t| t.is_winner())
        .map(|t| t.net_pnl)
        .collect();
    mean_f64(&wins)
}

/// Mean net P&L of losing trades (negative).
pub fn avg_loss(trades: &[Trade]) -> f64 {
    let losses: Vec<f64> = trades
        .iter()
        .filter(|t| t.is_loser())
        .map(|t| t.net_pnl)
        .collect();
    mean_f64(&losses)
}

/// Profit factor: gross profits / gross losses.
///
/// Defined as 0 when there are no losing trades, including the all-winners
/// case, so no infinity reaches a stored result.
pub fn profit_factor(trades: &[Trade]) -> f64 {
    let gross_profit: f64 = trades
        .iter()
        .filter(|t| t.is_winner())
        .map(|t| t.net_pnl)
        .sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.is_loser())
        .map(|t| t.net_pnl)
        .sum();

    if gross_loss == 0.0 {
        return 0.0;
    }
    (gross_profit / gross_loss).abs()
}

pub fn largest_win(trades: &[Trade]) -> f64 {
    trades
        .iter()
        .filter(|t| t.is_winner())
        .map(|t| t.net_pnl)
        .fold(0.0, f64::max)
}

pub fn largest_loss(trades: &[Trade]) -> f64 {
    trades
        .iter()
        .filter(|t| t.is_loser())
        .map(|t| t.net_pnl)
        .fold(0.0, f64::min)
}

/// Mean net P&L per trade.
pub fn expectancy(trades: &[Trade]) -> f64 {
    mean_f64(&trades.iter().map(|t| t.net_pnl).collect::<Vec<_>>())
}

// ─── Equity curve statistics ────────────────────────────────────────

/// Maximum drawdown as a positive percent (e.g., 15.0 = 15% drawdown).
///
/// Returns 0.0 if equity is constant or monotonically increasing.
pub fn max_drawdown_pct(equity_curve: &[f64]) -> f64 {
    let Some(&first) = equity_curve.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0_f64;

    for &eq in equity_curve {
        if eq > peak {
            peak = eq;
        }
        if peak > 0.0 {
            max_dd = max_dd.max((peak - eq) / peak);
        }
    }
    max_dd * 100.0
}

/// Annualized Sharpe ratio from per-bar returns.
///
/// Sharpe = mean(returns) / std(returns) * sqrt(252).
/// Returns 0.0 if variance is zero or fewer than 2 returns.
pub fn sharpe_ratio(equity_curve: &[f64]) -> f64 {
    let returns = bar_returns(equity_curve);
    if returns.len() < 2 {
        return 0.0;
    }
    let std = std_dev(&returns);
    if std < 1e-15 {
        return 0.0;
    }
    mean_f64(&returns) / std * PERIODS_PER_YEAR.sqrt()
}

/// Annualized Sortino ratio (downside deviation only).
///
/// Returns 0.0 if there is no downside or fewer than 2 returns.
pub fn sortino_ratio(equity_curve: &[f64]) -> f64 {
    let returns = bar_returns(equity_curve);
    if returns.len() < 2 {
        return 0.0;
    }
    let downside_sq: f64 = returns.iter().filter(|&&r| r < 0.0).map(|r| r * r).sum();
    let downside_std = (downside_sq / returns.len() as f64).sqrt();
    if downside_std < 1e-15 {
        return 0.0;
    }
    mean_f64(&returns) / downside_std * PERIODS_PER_YEAR.sqrt()
}

/// Per-bar returns summed by the calendar month of the later point.
pub fn monthly_returns(equity_curve: &[EquityPoint]) -> Vec<MonthlyReturn> {
    let mut buckets: BTreeMap<String, f64> = BTreeMap::new();
    for w in equity_curve.windows(2) {
        let r = if w[0].equity > 0.0 {
            (w[1].equity - w[0].equity) / w[0].equity
        } else {
            0.0
        };
        *buckets
            .entry(w[1].timestamp.format("%Y-%m").to_string())
            .or_insert(0.0) += r;
    }
    buckets
        .into_iter()
        .map(|(month, r)| MonthlyReturn {
            month,
            return_pct: r * 100.0,
        })
        .collect()
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Simple returns between consecutive equity values.
pub fn bar_returns(equity_curve: &[f64]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .map(|w| {
            if w[0] > 0.0 {
                (w[1] - w[0]) / w[0]
            } else {
                0.0
            }
        })
        .collect()
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

fn max_consecutive(trades: &[Trade], pred: fn(&Trade) -> bool) -> usize {
    let mut max_streak = 0;
    let mut current = 0;

    for trade in trades {
        if pred(trade) {
            current += 1;
            max_streak = max_streak.max(current);
        } else {
            current = 0;
        }
    }
    max_streak
}

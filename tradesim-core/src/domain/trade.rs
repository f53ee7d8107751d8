//! Trade: a completed round trip, immutable once created.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::indicators::IndicatorSnapshot;

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    Signal,
    EndOfData,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExitReason::StopLoss => "STOP_LOSS",
            ExitReason::TakeProfit => "TAKE_PROFIT",
            ExitReason::Signal => "SIGNAL",
            ExitReason::EndOfData => "END_OF_DATA",
        };
        f.write_str(s)
    }
}

/// A closed long round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub symbol: String,

    pub entry_bar: usize,
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,

    pub exit_bar: usize,
    pub exit_time: DateTime<Utc>,
    pub exit_price: f64,

    pub shares: f64,

    /// (exit - entry) * shares, before commission.
    pub gross_pnl: f64,
    /// Gross P&L less entry and exit commission.
    pub net_pnl: f64,
    /// Net P&L as a percent of entry notional.
    pub pnl_pct: f64,
    /// Entry plus exit commission.
    pub commission: f64,
    /// Dollar cost of slippage on both fills.
    pub slippage: f64,

    pub exit_reason: ExitReason,

    /// Worst `(low - entry) / entry` over the bars the position was managed.
    pub mae: f64,
    /// Best `(high - entry) / entry` over the bars the position was managed.
    pub mfe: f64,
    pub bars_held: usize,

    /// Indicators as of the bar whose close triggered the entry.
    pub entry_snapshot: IndicatorSnapshot,
    /// Indicators as of the bar that decided the exit.
    pub exit_snapshot: IndicatorSnapshot,
}

impl Trade {
    pub fn is_winner(&self) -> bool {
        self.net_pnl > 0.0
    }

    pub fn is_loser(&self) -> bool {
        self.net_pnl < 0.0
    }
}

//! Position: an open long holding, or the trade it became.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::trade::Trade;
use crate::indicators::IndicatorSnapshot;

/// Position state. A position moves from `Open` to `Closed` exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Position {
    Open(OpenPosition),
    Closed(Trade),
}

impl Position {
    pub fn is_open(&self) -> bool {
        matches!(self, Position::Open(_))
    }
}

/// A long holding that has not been closed yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenPosition {
    pub entry_bar: usize,
    pub entry_time: DateTime<Utc>,
    /// Fill price including slippage.
    pub entry_price: f64,
    pub shares: f64,
    /// shares * entry_price
    pub cost: f64,
    pub entry_commission: f64,
    pub entry_slippage: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    /// Lowest low seen while managed.
    pub lowest_low: Option<f64>,
    /// Highest high seen while managed.
    pub highest_high: Option<f64>,
    pub bars_held: usize,
    pub entry_snapshot: IndicatorSnapshot,
    /// Set when the exit rules matched; the position closes on the next bar.
    pub exit_signal: Option<IndicatorSnapshot>,
}

impl OpenPosition {
    /// Cash held by this position: notional plus the entry commission.
    pub fn reserved(&self) -> f64 {
        self.cost + self.entry_commission
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.shares * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.shares * (price - self.entry_price)
    }

    /// Record one managed bar's range.
    pub fn update_excursions(&mut self, high: f64, low: f64) {
        self.lowest_low = Some(self.lowest_low.map_or(low, |l| l.min(low)));
        self.highest_high = Some(self.highest_high.map_or(high, |h| h.max(high)));
    }

    /// Worst percent move against entry; 0 if no bar has been managed yet.
    pub fn mae(&self) -> f64 {
        self.lowest_low
            .map_or(0.0, |low| (low - self.entry_price) / self.entry_price)
    }

    /// Best percent move in favour of entry; 0 if no bar has been managed yet.
    pub fn mfe(&self) -> f64 {
        self.highest_high
            .map_or(0.0, |high| (high - self.entry_price) / self.entry_price)
    }
}

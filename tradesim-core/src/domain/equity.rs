//! Equity curve points.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Total portfolio value at the close of one simulated bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    #[serde(rename = "date")]
    pub timestamp: DateTime<Utc>,
    /// cash + sum of open shares * close
    pub equity: f64,
}

impl EquityPoint {
    pub fn new(timestamp: DateTime<Utc>, equity: f64) -> Self {
        Self { timestamp, equity }
    }
}

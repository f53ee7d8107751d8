//! TOML backtest configuration.
//!
//! ```toml
//! [backtest]
//! symbol = "SPY"
//! start_date = "2022-01-03"
//! end_date = "2023-12-29"
//! timeframe = "1d"
//! data_path = "data/SPY.csv"
//!
//! [strategy]
//! id = "rsi-reversion"
//! entry_conditions = [{ indicator = "RSI", operator = "<", value = 30 }]
//! exit_conditions = [{ indicator = "RSI", operator = ">", value = 70 }]
//! sizing = { method = "PERCENT_CAPITAL", parameter = 10 }
//! commission_pct = 0.1
//! slippage_pct = 0.05
//! initial_capital = 10000
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tradesim_core::domain::Timeframe;
use tradesim_core::engine::{EngineConfig, StrategyDefinition, StrategyError};

use crate::store::DateRange;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid strategy: {0}")]
    Invalid(#[from] StrategyError),

    #[error("start_date {start} is after end_date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("strategy file {path} declares id '{found}', expected '{expected}'")]
    IdMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },
}

/// `[backtest]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSection {
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default = "default_timeframe")]
    pub timeframe: Timeframe,
    /// CSV or Parquet file with the symbol's bars.
    #[serde(default)]
    pub data_path: Option<PathBuf>,
    /// Overrides the derived warm-up index when larger.
    #[serde(default)]
    pub warmup_bars: Option<usize>,
}

fn default_timeframe() -> Timeframe {
    Timeframe::Day1
}

impl BacktestSection {
    pub fn date_range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            warmup_bars: self.warmup_bars,
            ..EngineConfig::default()
        }
    }
}

/// A complete config file: run settings plus the strategy under test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub backtest: BacktestSection,
    pub strategy: StrategyDefinition,
}

impl BacktestConfig {
    /// Parse and validate.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: BacktestConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_toml(&read(path)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backtest.start_date > self.backtest.end_date {
            return Err(ConfigError::InvalidRange {
                start: self.backtest.start_date,
                end: self.backtest.end_date,
            });
        }
        self.strategy.validate()?;
        Ok(())
    }
}

/// Parse a standalone strategy document (the `[strategy]` table's fields at
/// top level) and validate it.
pub fn parse_strategy(text: &str) -> Result<StrategyDefinition, ConfigError> {
    let strategy: StrategyDefinition = toml::from_str(text)?;
    strategy.validate()?;
    Ok(strategy)
}

pub(crate) fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

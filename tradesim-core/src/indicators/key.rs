//! Typed indicator names.
//!
//! Strategy conditions and snapshots refer to indicators by `IndicatorKey`
//! rather than free-form strings, so an unknown name is rejected when a
//! strategy is loaded instead of silently evaluating to "absent" every bar.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::{
    Adx, Atr, Bollinger, BollingerBand, Ema, Indicator, Macd, MacdOutput, PriceField,
    PriceSeries, Rsi, Sma, Stochastic, StochasticLine,
};

pub const BOLLINGER_PERIOD: usize = 20;
pub const BOLLINGER_MULTIPLIER: f64 = 2.0;
pub const STOCH_K_PERIOD: usize = 14;
pub const STOCH_D_PERIOD: usize = 3;
pub const ADX_PERIOD: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;

/// Longest period accepted for parameterised indicators.
pub const MAX_PERIOD: usize = 10_000;

const DEFAULT_RSI_PERIOD: usize = 14;
const DEFAULT_ATR_PERIOD: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum IndicatorKey {
    Close,
    Volume,
    Rsi(usize),
    Sma(usize),
    Ema(usize),
    Atr(usize),
    BollingerUpper,
    BollingerMiddle,
    BollingerLower,
    BollingerWidth,
    StochK,
    StochD,
    Adx,
    Macd,
    MacdSignal,
    MacdHistogram,
}

#[derive(Debug, Error, PartialEq)]
#[error("unknown indicator '{0}'")]
pub struct ParseIndicatorError(pub String);

impl IndicatorKey {
    /// The indicators every snapshot carries once their warm-up is satisfied.
    pub fn catalog() -> Vec<IndicatorKey> {
        let mut keys = vec![IndicatorKey::Close, IndicatorKey::Volume];
        keys.extend([9, 14, 25].map(IndicatorKey::Rsi));
        keys.extend([10, 20, 50, 100, 200].map(IndicatorKey::Sma));
        keys.extend([10, 20, 50, 100, 200].map(IndicatorKey::Ema));
        keys.extend([14, 20].map(IndicatorKey::Atr));
        keys.extend([
            IndicatorKey::BollingerUpper,
            IndicatorKey::BollingerMiddle,
            IndicatorKey::BollingerLower,
            IndicatorKey::BollingerWidth,
            IndicatorKey::StochK,
            IndicatorKey::StochD,
            IndicatorKey::Adx,
            IndicatorKey::Macd,
            IndicatorKey::MacdSignal,
            IndicatorKey::MacdHistogram,
        ]);
        keys
    }

    /// Build the calculator behind this key.
    pub fn indicator(&self) -> Box<dyn Indicator> {
        let bb = |band| -> Box<dyn Indicator> {
            Box::new(Bollinger::new(BOLLINGER_PERIOD, BOLLINGER_MULTIPLIER, band))
        };
        let macd = |output| -> Box<dyn Indicator> {
            Box::new(Macd::new(MACD_FAST, MACD_SLOW, MACD_SIGNAL, output))
        };
        match *self {
            IndicatorKey::Close => Box::new(PriceSeries::new(PriceField::Close)),
            IndicatorKey::Volume => Box::new(PriceSeries::new(PriceField::Volume)),
            IndicatorKey::Rsi(p) => Box::new(Rsi::new(p)),
            IndicatorKey::Sma(p) => Box::new(Sma::new(p)),
            IndicatorKey::Ema(p) => Box::new(Ema::new(p)),
            IndicatorKey::Atr(p) => Box::new(Atr::new(p)),
            IndicatorKey::BollingerUpper => bb(BollingerBand::Upper),
            IndicatorKey::BollingerMiddle => bb(BollingerBand::Middle),
            IndicatorKey::BollingerLower => bb(BollingerBand::Lower),
            IndicatorKey::BollingerWidth => bb(BollingerBand::Width),
            IndicatorKey::StochK => Box::new(Stochastic::new(
                STOCH_K_PERIOD,
                STOCH_D_PERIOD,
                StochasticLine::K,
            )),
            IndicatorKey::StochD => Box::new(Stochastic::new(
                STOCH_K_PERIOD,
                STOCH_D_PERIOD,
                StochasticLine::D,
            )),
            IndicatorKey::Adx => Box::new(Adx::new(ADX_PERIOD)),
            IndicatorKey::Macd => macd(MacdOutput::Line),
            IndicatorKey::MacdSignal => macd(MacdOutput::Signal),
            IndicatorKey::MacdHistogram => macd(MacdOutput::Histogram),
        }
    }

    /// Period of a parameterised indicator.
    pub fn period(&self) -> Option<usize> {
        match *self {
            IndicatorKey::Rsi(p)
            | IndicatorKey::Sma(p)
            | IndicatorKey::Ema(p)
            | IndicatorKey::Atr(p) => Some(p),
            _ => None,
        }
    }

    /// Index of the first bar at which this indicator has a value.
    pub fn lookback(&self) -> usize {
        self.indicator().lookback()
    }
}

impl fmt::Display for IndicatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorKey::Close => f.write_str("CLOSE"),
            IndicatorKey::Volume => f.write_str("VOLUME"),
            IndicatorKey::Rsi(p) if *p == DEFAULT_RSI_PERIOD => f.write_str("RSI"),
            IndicatorKey::Rsi(p) => write!(f, "RSI_{p}"),
            IndicatorKey::Sma(p) => write!(f, "SMA_{p}"),
            IndicatorKey::Ema(p) => write!(f, "EMA_{p}"),
            IndicatorKey::Atr(p) if *p == DEFAULT_ATR_PERIOD => f.write_str("ATR"),
            IndicatorKey::Atr(p) => write!(f, "ATR_{p}"),
            IndicatorKey::BollingerUpper => f.write_str("BB_UPPER"),
            IndicatorKey::BollingerMiddle => f.write_str("BB_MIDDLE"),
            IndicatorKey::BollingerLower => f.write_str("BB_LOWER"),
            IndicatorKey::BollingerWidth => f.write_str("BB_WIDTH"),
            IndicatorKey::StochK => f.write_str("STOCH_K"),
            IndicatorKey::StochD => f.write_str("STOCH_D"),
            IndicatorKey::Adx => f.write_str("ADX"),
            IndicatorKey::Macd => f.write_str("MACD"),
            IndicatorKey::MacdSignal => f.write_str("MACD_SIGNAL"),
            IndicatorKey::MacdHistogram => f.write_str("MACD_HIST"),
        }
    }
}

impl FromStr for IndicatorKey {
    type Err = ParseIndicatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_uppercase();
        let fixed = match name.as_str() {
            "CLOSE" | "PRICE" => Some(IndicatorKey::Close),
            "VOLUME" => Some(IndicatorKey::Volume),
            "RSI" => Some(IndicatorKey::Rsi(DEFAULT_RSI_PERIOD)),
            "ATR" => Some(IndicatorKey::Atr(DEFAULT_ATR_PERIOD)),
            "BB_UPPER" => Some(IndicatorKey::BollingerUpper),
            "BB_MIDDLE" => Some(IndicatorKey::BollingerMiddle),
            "BB_LOWER" => Some(IndicatorKey::BollingerLower),
            "BB_WIDTH" => Some(IndicatorKey::BollingerWidth),
            "STOCH_K" => Some(IndicatorKey::StochK),
            "STOCH_D" => Some(IndicatorKey::StochD),
            "ADX" => Some(IndicatorKey::Adx),
            "MACD" => Some(IndicatorKey::Macd),
            "MACD_SIGNAL" => Some(IndicatorKey::MacdSignal),
            "MACD_HIST" | "MACD_HISTOGRAM" => Some(IndicatorKey::MacdHistogram),
            _ => None,
        };
        if let Some(key) = fixed {
            return Ok(key);
        }

        let err = || ParseIndicatorError(s.to_string());
        let (family, period) = name.split_once('_').ok_or_else(err)?;
        let period: usize = period.parse().map_err(|_| err())?;
        if period == 0 || period > MAX_PERIOD {
            return Err(err());
        }
        match family {
            "RSI" => Ok(IndicatorKey::Rsi(period)),
            "SMA" => Ok(IndicatorKey::Sma(period)),
            "EMA" => Ok(IndicatorKey::Ema(period)),
            "ATR" => Ok(IndicatorKey::Atr(period)),
            _ => Err(err()),
        }
    }
}

impl TryFrom<String> for IndicatorKey {
    type Error = ParseIndicatorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<IndicatorKey> for String {
    fn from(key: IndicatorKey) -> Self {
        key.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_resolve_to_default_periods() {
        assert_eq!("RSI".parse::<IndicatorKey>().unwrap(), IndicatorKey::Rsi(14));
        assert_eq!("rsi_14".parse::<IndicatorKey>().unwrap(), IndicatorKey::Rsi(14));
        assert_eq!("ATR".parse::<IndicatorKey>().unwrap(), IndicatorKey::Atr(14));
        assert_eq!("SMA_30".parse::<IndicatorKey>().unwrap(), IndicatorKey::Sma(30));
    }

    #[test]
    fn display_parses_back() {
        for key in IndicatorKey::catalog() {
            assert_eq!(key.to_string().parse::<IndicatorKey>().unwrap(), key);
        }
    }

    #[test]
    fn rejects_unknown_names() {
        assert!("VWAP".parse::<IndicatorKey>().is_err());
        assert!("SMA_0".parse::<IndicatorKey>().is_err());
        assert!("SMA_X".parse::<IndicatorKey>().is_err());
        assert!("BB_UPPER_3".parse::<IndicatorKey>().is_err());
    }

    #[test]
    fn rejects_periods_past_the_cap() {
        assert_eq!(
            "SMA_10000".parse::<IndicatorKey>().unwrap(),
            IndicatorKey::Sma(MAX_PERIOD)
        );
        assert!("SMA_10001".parse::<IndicatorKey>().is_err());
        assert!("RSI_18446744073709551615".parse::<IndicatorKey>().is_err());
        let json = r#""EMA_99999999""#;
        assert!(serde_json::from_str::<IndicatorKey>(json).is_err());
    }

    #[test]
    fn lookback_saturates_for_huge_periods() {
        assert_eq!(IndicatorKey::Rsi(usize::MAX).lookback(), usize::MAX);
        assert_eq!(IndicatorKey::Sma(usize::MAX).lookback(), usize::MAX - 1);
    }

    #[test]
    fn warm_up_windows() {
        assert_eq!(IndicatorKey::Rsi(14).lookback(), 14);
        assert_eq!(IndicatorKey::Sma(200).lookback(), 199);
        assert_eq!(IndicatorKey::Macd.lookback(), 25);
        assert_eq!(IndicatorKey::MacdSignal.lookback(), 33);
        assert_eq!(IndicatorKey::Adx.lookback(), 27);
        assert_eq!(IndicatorKey::Close.lookback(), 0);
    }

    #[test]
    fn serde_as_name() {
        let json = serde_json::to_string(&IndicatorKey::Sma(50)).unwrap();
        assert_eq!(json, "\"SMA_50\"");
        let back: IndicatorKey = serde_json::from_str("\"BB_WIDTH\"").unwrap();
        assert_eq!(back, IndicatorKey::BollingerWidth);
    }
}

//! Bar interval.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Timeframe {
    Minute1,
    Minute5,
    Minute15,
    Minute30,
    Hour1,
    Hour4,
    Day1,
    Week1,
}

#[derive(Debug, Error, PartialEq)]
#[error("unknown timeframe '{0}' (expected 1m, 5m, 15m, 30m, 1h, 4h, 1d or 1wk)")]
pub struct ParseTimeframeError(pub String);

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Minute1 => "1m",
            Timeframe::Minute5 => "5m",
            Timeframe::Minute15 => "15m",
            Timeframe::Minute30 => "30m",
            Timeframe::Hour1 => "1h",
            Timeframe::Hour4 => "4h",
            Timeframe::Day1 => "1d",
            Timeframe::Week1 => "1wk",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = ParseTimeframeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1m" => Ok(Timeframe::Minute1),
            "5m" => Ok(Timeframe::Minute5),
            "15m" => Ok(Timeframe::Minute15),
            "30m" => Ok(Timeframe::Minute30),
            "1h" | "60m" => Ok(Timeframe::Hour1),
            "4h" => Ok(Timeframe::Hour4),
            "1d" | "d" | "daily" => Ok(Timeframe::Day1),
            "1wk" | "1w" | "weekly" => Ok(Timeframe::Week1),
            _ => Err(ParseTimeframeError(s.to_string())),
        }
    }
}

impl TryFrom<String> for Timeframe {
    type Error = ParseTimeframeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Timeframe> for String {
    fn from(tf: Timeframe) -> Self {
        tf.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display_agree() {
        for tf in [
            Timeframe::Minute1,
            Timeframe::Minute5,
            Timeframe::Minute15,
            Timeframe::Minute30,
            Timeframe::Hour1,
            Timeframe::Hour4,
            Timeframe::Day1,
            Timeframe::Week1,
        ] {
            assert_eq!(tf.to_string().parse::<Timeframe>().unwrap(), tf);
        }
    }

    #[test]
    fn aliases() {
        assert_eq!("daily".parse::<Timeframe>().unwrap(), Timeframe::Day1);
        assert_eq!("1W".parse::<Timeframe>().unwrap(), Timeframe::Week1);
    }

    #[test]
    fn unknown_rejected() {
        assert!("3d".parse::<Timeframe>().is_err());
    }

    #[test]
    fn serde_as_string() {
        let json = serde_json::to_string(&Timeframe::Hour4).unwrap();
        assert_eq!(json, "\"4h\"");
        let back: Timeframe = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Timeframe::Hour4);
    }
}

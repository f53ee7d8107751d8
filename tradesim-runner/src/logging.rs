//! Logging setup using tracing. Logs go to stderr so stdout stays clean for
//! command output.

use std::fmt;
use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::{
    fmt::{self as tfmt, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable format
    #[default]
    Pretty,
    /// JSON lines for log aggregation
    Json,
    Compact,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            other => Err(format!(
                "unknown log format '{other}' (expected pretty, json or compact)"
            )),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
            LogFormat::Compact => "compact",
        })
    }
}

/// Install the global subscriber. `RUST_LOG` overrides `default_level`.
/// A second call is a no-op.
pub fn init_logging(format: LogFormat, default_level: Level) {
    let mut env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();
    if let Ok(directive) = "polars=warn".parse() {
        env_filter = env_filter.add_directive(directive);
    }

    let result = match format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tfmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tfmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init(),
        LogFormat::Compact => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tfmt::layer()
                    .compact()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_thread_ids(false),
            )
            .try_init(),
    };
    if result.is_err() {
        tracing::debug!("global subscriber already installed");
    }
}

pub fn init_default_logging() {
    init_logging(LogFormat::Pretty, Level::INFO);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_formats() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("Compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("xml".parse::<LogFormat>().is_err());
        assert_eq!(LogFormat::default().to_string(), "pretty");
    }

    #[test]
    fn second_init_is_harmless() {
        init_logging(LogFormat::Compact, Level::WARN);
        init_logging(LogFormat::Json, Level::WARN);
    }
}

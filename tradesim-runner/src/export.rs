//! Run artifacts: JSON summary plus CSV trade tape and equity curve.
//!
//! Summaries carry a `schema_version`; newer versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tradesim_core::domain::{EquityPoint, Trade};

use crate::result::{ResultSummary, SCHEMA_VERSION};
use crate::store::BacktestRun;

// ─── JSON ───────────────────────────────────────────────────────────

pub fn export_json(run: &BacktestRun) -> Result<String> {
    serde_json::to_string_pretty(run).context("failed to serialize run record to JSON")
}

/// Parse a result summary, rejecting unknown schema versions.
pub fn import_summary(json: &str) -> Result<ResultSummary> {
    let summary: ResultSummary =
        serde_json::from_str(json).context("failed to deserialize result summary")?;
    if summary.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            summary.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(summary)
}

// ─── CSV ────────────────────────────────────────────────────────────

/// Columns: symbol, entry_bar, entry_time, entry_price, exit_bar, exit_time,
/// exit_price, shares, gross_pnl, commission, slippage, net_pnl, pnl_pct,
/// exit_reason, bars_held, mae, mfe
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "symbol",
        "entry_bar",
        "entry_time",
        "entry_price",
        "exit_bar",
        "exit_time",
        "exit_price",
        "shares",
        "gross_pnl",
        "commission",
        "slippage",
        "net_pnl",
        "pnl_pct",
        "exit_reason",
        "bars_held",
        "mae",
        "mfe",
    ])?;

    for t in trades {
        wtr.write_record([
            &t.symbol,
            &t.entry_bar.to_string(),
            &t.entry_time.to_rfc3339(),
            &format!("{:.6}", t.entry_price),
            &t.exit_bar.to_string(),
            &t.exit_time.to_rfc3339(),
            &format!("{:.6}", t.exit_price),
            &format!("{}", t.shares),
            &format!("{:.2}", t.gross_pnl),
            &format!("{:.2}", t.commission),
            &format!("{:.2}", t.slippage),
            &format!("{:.2}", t.net_pnl),
            &format!("{:.4}", t.pnl_pct),
            &t.exit_reason.to_string(),
            &t.bars_held.to_string(),
            &format!("{:.6}", t.mae),
            &format!("{:.6}", t.mfe),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Columns: date, equity
pub fn export_equity_csv(equity_curve: &[EquityPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "equity"])?;
    for p in equity_curve {
        wtr.write_record([&p.timestamp.to_rfc3339(), &format!("{:.2}", p.equity)])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write `{output_dir}/{run_id}/` with `run.json`, plus `trades.csv` and
/// `equity.csv` when the run completed. Returns the directory.
pub fn save_artifacts(run: &BacktestRun, output_dir: &Path) -> Result<PathBuf> {
    if !run.id.is_well_formed() {
        bail!("refusing to write artifacts for malformed run id '{}'", run.id);
    }
    let run_dir = output_dir.join(run.id.as_str());
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("run.json"), export_json(run)?)?;

    if let Some(summary) = &run.result_summary {
        std::fs::write(run_dir.join("trades.csv"), export_trades_csv(&summary.trades)?)?;
        std::fs::write(
            run_dir.join("equity.csv"),
            export_equity_csv(&summary.equity_curve)?,
        )?;
    }

    Ok(run_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::PerformanceMetrics;
    use crate::store::{DateRange, RunId};
    use chrono::{Duration, NaiveDate, TimeZone, Utc};
    use tradesim_core::domain::{ExitReason, Timeframe};
    use tradesim_core::indicators::IndicatorSnapshot;

    fn trade() -> Trade {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        Trade {
            symbol: "SPY".into(),
            entry_bar: 210,
            entry_time: t0,
            entry_price: 100.05,
            exit_bar: 230,
            exit_time: t0 + Duration::days(20),
            exit_price: 109.9,
            shares: 9.0,
            gross_pnl: 88.65,
            net_pnl: 86.75,
            pnl_pct: 9.63,
            commission: 1.9,
            slippage: 0.99,
            exit_reason: ExitReason::Signal,
            mae: -0.012,
            mfe: 0.11,
            bars_held: 20,
            entry_snapshot: IndicatorSnapshot::default(),
            exit_snapshot: IndicatorSnapshot::default(),
        }
    }

    #[test]
    fn trades_csv_has_header_and_rows() {
        let csv = export_trades_csv(&[trade(), trade()]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("symbol,entry_bar,entry_time"));
        assert!(lines[1].contains(",SIGNAL,"));
        assert!(lines[1].starts_with("SPY,210,2024-01-02T00:00:00+00:00,100.050000"));
    }

    #[test]
    fn equity_csv_rows() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let csv = export_equity_csv(&[EquityPoint::new(t0, 10_000.0)]).unwrap();
        assert_eq!(csv, "date,equity\n2024-01-02T00:00:00+00:00,10000.00\n");
    }

    #[test]
    fn newer_schema_is_rejected() {
        let summary = ResultSummary {
            schema_version: SCHEMA_VERSION + 1,
            metrics: PerformanceMetrics::compute(&[], &[], 1_000.0),
            equity_curve: Vec::new(),
            monthly_returns: Vec::new(),
            trades: Vec::new(),
            initial_capital: 1_000.0,
            warmup_index: 0,
            bar_count: 0,
            dataset_hash: String::new(),
        };
        let json = serde_json::to_string(&summary).unwrap();
        let err = import_summary(&json).unwrap_err();
        assert!(err.to_string().contains("unsupported schema version"));
    }

    #[test]
    fn artifacts_for_failed_run_have_no_csv() {
        let dir = tempfile::tempdir().unwrap();
        let d = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let run = BacktestRun::running(
            RunId("00000000000abc12".into()),
            "rsi",
            "SPY",
            DateRange::new(d, d),
            Timeframe::Day1,
        );
        let out = save_artifacts(&run, dir.path()).unwrap();
        assert!(out.join("run.json").is_file());
        assert!(!out.join("trades.csv").exists());
    }

    #[test]
    fn artifacts_refuse_path_like_ids() {
        let dir = tempfile::tempdir().unwrap();
        let d = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let run = BacktestRun::running(
            RunId("../outside".into()),
            "rsi",
            "SPY",
            DateRange::new(d, d),
            Timeframe::Day1,
        );
        assert!(save_artifacts(&run, &dir.path().join("out")).is_err());
        assert!(!dir.path().join("outside").exists());
    }
}

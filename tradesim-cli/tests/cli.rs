//! End-to-end tests of the `tradesim` binary.

use std::path::Path;
use std::process::{Command, Output};

use chrono::NaiveDate;
use tradesim_core::domain::Timeframe;
use tradesim_runner::{BacktestRun, DateRange, JsonRunStore, RunId, RunStatus, RunStore};

fn tradesim(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tradesim"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn write_config(dir: &Path, data: &Path, start: &str) -> String {
    let path = dir.join("rsi.toml");
    let text = format!(
        r#"[backtest]
symbol = "SPY"
start_date = "{start}"
end_date = "2023-12-29"
data_path = "{}"

[strategy]
id = "rsi-reversion"
entry_conditions = [{{ indicator = "RSI", operator = "<", value = 30 }}]
exit_conditions = [{{ indicator = "RSI", operator = ">", value = 70 }}]
sizing = {{ method = "PERCENT_CAPITAL", parameter = 10 }}
commission_pct = 0.1
slippage_pct = 0.05
initial_capital = 10000
"#,
        data.display().to_string().replace('\\', "/")
    );
    std::fs::write(&path, text).unwrap();
    path.display().to_string()
}

#[test]
fn synth_run_and_list() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("SPY.csv");
    let store = dir.path().join("runs");
    let results = dir.path().join("results");

    let out = tradesim(&[
        "synth",
        "--symbol",
        "SPY",
        "--start",
        "2022-01-03",
        "--end",
        "2023-12-29",
        "--out",
        data.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "{out:?}");
    assert!(data.is_file());

    let config = write_config(dir.path(), &data, "2022-01-03");
    let out = tradesim(&[
        "run",
        "--config",
        &config,
        "--store",
        store.to_str().unwrap(),
        "--output-dir",
        results.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "{out:?}");
    let text = stdout(&out);
    assert!(text.contains("Status:         COMPLETED"), "{text}");
    assert!(text.contains("Artifacts saved to:"), "{text}");

    let out = tradesim(&["runs", "list", "--store", store.to_str().unwrap()]);
    assert!(out.status.success(), "{out:?}");
    let text = stdout(&out);
    assert!(text.contains("COMPLETED"), "{text}");
    assert!(text.contains("rsi-reversion"), "{text}");
}

#[test]
fn short_range_fails_with_insufficient_data() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("SPY.parquet");
    let store = dir.path().join("runs");

    let out = tradesim(&[
        "synth",
        "--symbol",
        "SPY",
        "--start",
        "2022-01-03",
        "--end",
        "2023-12-29",
        "--out",
        data.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "{out:?}");

    let config = write_config(dir.path(), &data, "2023-09-01");
    let out = tradesim(&["run", "--config", &config, "--store", store.to_str().unwrap()]);
    assert!(!out.status.success());
    let err = String::from_utf8_lossy(&out.stderr);
    assert!(err.contains("insufficient historical data"), "{err}");

    let out = tradesim(&["runs", "list", "--store", store.to_str().unwrap()]);
    assert!(stdout(&out).contains("FAILED"));
}

#[test]
fn concurrent_run_in_same_store_stays_running() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("SPY.csv");
    let store_dir = dir.path().join("runs");

    // A run another process is still executing.
    let store = JsonRunStore::open(&store_dir).unwrap();
    let range = DateRange::new(
        NaiveDate::from_ymd_opt(2022, 1, 3).unwrap(),
        NaiveDate::from_ymd_opt(2023, 12, 29).unwrap(),
    );
    let id = RunId::derive("other", "QQQ", &range, Timeframe::Day1, 0);
    let live = BacktestRun::running(id.clone(), "other", "QQQ", range, Timeframe::Day1);
    store.create_running(&live).unwrap();

    let out = tradesim(&[
        "synth", "--symbol", "SPY", "--start", "2022-01-03", "--end", "2023-12-29", "--out",
        data.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "{out:?}");
    let config = write_config(dir.path(), &data, "2022-01-03");
    let out = tradesim(&[
        "run",
        "--config",
        &config,
        "--store",
        store_dir.to_str().unwrap(),
        "--output-dir",
        dir.path().join("results").to_str().unwrap(),
    ]);
    assert!(out.status.success(), "{out:?}");

    assert_eq!(store.get(&id).unwrap().unwrap().status, RunStatus::Running);
    store.fail(&id, "cancelled").unwrap();
}

#[test]
fn run_without_data_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("c.toml");
    std::fs::write(
        &path,
        r#"[backtest]
symbol = "SPY"
start_date = "2022-01-03"
end_date = "2023-12-29"

[strategy]
id = "x"
entry_conditions = [{ indicator = "RSI", operator = "<", value = 30 }]
sizing = { method = "FIXED", parameter = 1000 }
initial_capital = 10000
"#,
    )
    .unwrap();
    let out = tradesim(&["run", "--config", path.to_str().unwrap()]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("no data"));
}

#[test]
fn recover_on_empty_store() {
    let dir = tempfile::tempdir().unwrap();
    let out = tradesim(&["runs", "recover", "--store", dir.path().to_str().unwrap()]);
    assert!(out.status.success(), "{out:?}");
    assert!(stdout(&out).contains("No abandoned runs."));
}

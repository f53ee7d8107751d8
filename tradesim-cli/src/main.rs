//! TradeSim CLI: run backtests, generate synthetic data, inspect run records.
//!
//! Commands:
//! - `run`: execute a backtest from a TOML config file
//! - `synth`: write a deterministic synthetic series as CSV or Parquet
//! - `runs list`: list persisted run records
//! - `runs show`: print one run record as JSON
//! - `runs recover`: mark runs left RUNNING by a dead process as FAILED

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::Level;
use tradesim_core::domain::{BarSeries, Timeframe};
use tradesim_runner::data_loader::{generate_synthetic_bars, write_series};
use tradesim_runner::export::{export_json, save_artifacts};
use tradesim_runner::{
    init_logging, BacktestConfig, BacktestRun, BacktestService, BarSource, DataDirSource,
    FileSource, InMemoryRunStore, InMemoryStrategyStore, JsonRunStore, LogFormat, RunId,
    RunStatus, RunStore, SeriesCache, SyntheticSource,
};

#[derive(Parser)]
#[command(name = "tradesim", about = "TradeSim CLI: bar-by-bar strategy backtester")]
struct Cli {
    /// Log format: pretty, compact or json.
    #[arg(long, global = true, default_value = "pretty")]
    log_format: LogFormat,

    /// Debug-level logging (RUST_LOG still takes precedence).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file.
    Run {
        /// Path to a TOML config file with [backtest] and [strategy] tables.
        #[arg(long)]
        config: PathBuf,

        /// CSV / Parquet file, or a directory of {SYMBOL}.csv|parquet files.
        /// Overrides `data_path` in the config.
        #[arg(long)]
        data: Option<PathBuf>,

        /// Use a synthetic random walk when no data path is given.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Run record directory. Without it, records live in memory only.
        /// Several runs may share one directory.
        #[arg(long)]
        store: Option<PathBuf>,

        /// Output directory for run.json, trades.csv and equity.csv.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Write a deterministic synthetic series (.csv or .parquet).
    Synth {
        #[arg(long)]
        symbol: String,

        /// Start date (YYYY-MM-DD).
        #[arg(long)]
        start: NaiveDate,

        /// End date (YYYY-MM-DD).
        #[arg(long)]
        end: NaiveDate,

        #[arg(long, default_value = "1d")]
        timeframe: Timeframe,

        /// Output file; the extension picks the format.
        #[arg(long)]
        out: PathBuf,
    },
    /// Run record management.
    Runs {
        #[command(subcommand)]
        action: RunsAction,
    },
}

#[derive(Subcommand)]
enum RunsAction {
    /// List run records, oldest first.
    List {
        #[arg(long)]
        store: PathBuf,
    },
    /// Print one run record as JSON.
    Show {
        #[arg(long)]
        store: PathBuf,

        id: String,
    },
    /// Mark every RUNNING record FAILED (after a crash or restart).
    ///
    /// Only use this while no other `tradesim run` writes to the store.
    Recover {
        #[arg(long)]
        store: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    init_logging(cli.log_format, level);

    match cli.command {
        Commands::Run {
            config,
            data,
            synthetic,
            store,
            output_dir,
        } => run_backtest_cmd(config, data, synthetic, store, output_dir),
        Commands::Synth {
            symbol,
            start,
            end,
            timeframe,
            out,
        } => run_synth(&symbol, start, end, timeframe, out),
        Commands::Runs { action } => match action {
            RunsAction::List { store } => run_list(store),
            RunsAction::Show { store, id } => run_show(store, id),
            RunsAction::Recover { store } => run_recover(store),
        },
    }
}

fn run_backtest_cmd(
    config_path: PathBuf,
    data: Option<PathBuf>,
    synthetic: bool,
    store_dir: Option<PathBuf>,
    output_dir: PathBuf,
) -> Result<()> {
    let config = BacktestConfig::load(&config_path)?;
    let bt = &config.backtest;

    let source: Box<dyn BarSource> = match data.or_else(|| bt.data_path.clone()) {
        Some(path) if path.is_dir() => Box::new(DataDirSource::new(path)),
        Some(path) => Box::new(FileSource::new(path)),
        None if synthetic => Box::new(SyntheticSource::new(bt.start_date, bt.end_date)),
        None => bail!("no data: pass --data, set backtest.data_path, or use --synthetic"),
    };

    let runs: Box<dyn RunStore> = match store_dir {
        Some(dir) => {
            let store = JsonRunStore::open(&dir)
                .with_context(|| format!("failed to open run store {}", dir.display()))?;
            Box::new(store)
        }
        None => Box::new(InMemoryRunStore::new()),
    };

    let strategies: InMemoryStrategyStore = std::iter::once(config.strategy.clone()).collect();
    let cache = SeriesCache::default();
    let service = BacktestService::new(&strategies, source.as_ref(), &cache, runs.as_ref())
        .with_config(bt.engine_config());

    let id = service.run_backtest(
        &config.strategy.id,
        &bt.symbol,
        bt.start_date,
        bt.end_date,
        bt.timeframe,
    )?;

    let run = runs
        .get(&id)?
        .with_context(|| format!("run {id} missing from the store after completion"))?;
    print_summary(&run);
    let run_dir = save_artifacts(&run, &output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());
    Ok(())
}

fn run_synth(
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
    timeframe: Timeframe,
    out: PathBuf,
) -> Result<()> {
    if start > end {
        bail!("--start {start} is after --end {end}");
    }
    let bars = generate_synthetic_bars(symbol, timeframe, start, end);
    if bars.is_empty() {
        bail!("no bars between {start} and {end}");
    }
    let series = BarSeries::new(symbol, timeframe, bars)?;
    write_series(&series, &out)?;
    println!(
        "Wrote {} {} bars for {symbol} to {}",
        series.len(),
        timeframe,
        out.display()
    );
    Ok(())
}

fn open_store(dir: &Path) -> Result<JsonRunStore> {
    if !dir.is_dir() {
        bail!("run store does not exist: {}", dir.display());
    }
    JsonRunStore::open(dir).with_context(|| format!("failed to open run store {}", dir.display()))
}

fn run_list(store_dir: PathBuf) -> Result<()> {
    let store = open_store(&store_dir)?;
    let runs = store.list()?;
    if runs.is_empty() {
        println!("No runs in {}", store_dir.display());
        return Ok(());
    }

    println!(
        "{:<18} {:<10} {:<20} {:<8} {:<23} {:>10}",
        "ID", "STATUS", "STRATEGY", "SYMBOL", "RANGE", "RETURN"
    );
    for run in &runs {
        let ret = run
            .result_summary
            .as_ref()
            .map(|s| format!("{:.2}%", s.metrics.total_return_pct))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<18} {:<10} {:<20} {:<8} {:<23} {:>10}",
            run.id,
            run.status,
            run.strategy_id,
            run.symbol,
            format!("{}..{}", run.date_range.start, run.date_range.end),
            ret
        );
    }
    Ok(())
}

fn run_show(store_dir: PathBuf, id: String) -> Result<()> {
    let store = open_store(&store_dir)?;
    let Some(run) = store.get(&RunId::parse(&id)?)? else {
        bail!("run {id} not found in {}", store_dir.display());
    };
    println!("{}", export_json(&run)?);
    Ok(())
}

fn run_recover(store_dir: PathBuf) -> Result<()> {
    let store = open_store(&store_dir)?;
    let recovered = store.recover_abandoned()?;
    if recovered.is_empty() {
        println!("No abandoned runs.");
    } else {
        for id in &recovered {
            println!("Marked FAILED: {id}");
        }
        println!("Recovered {} run(s).", recovered.len());
    }
    Ok(())
}

fn print_summary(run: &BacktestRun) {
    println!();
    println!("=== Backtest Run {} ===", run.id);
    println!("Strategy:       {}", run.strategy_id);
    println!("Symbol:         {} ({})", run.symbol, run.timeframe);
    println!(
        "Period:         {} to {}",
        run.date_range.start, run.date_range.end
    );
    println!("Status:         {}", run.status);

    if run.status == RunStatus::Failed {
        if let Some(message) = &run.error_message {
            println!("Error:          {message}");
        }
        println!();
        return;
    }

    let Some(summary) = &run.result_summary else {
        println!();
        return;
    };
    let m = &summary.metrics;
    println!(
        "Bars:           {} ({} warmup)",
        summary.bar_count, summary.warmup_index
    );
    println!("Trades:         {} ({} won, {} lost)", m.total_trades, m.winning_trades, m.losing_trades);
    println!();
    println!("--- Performance ---");
    println!("Final Equity:   {:.2}", m.final_equity);
    println!("Total Return:   {:.2}%", m.total_return_pct);
    println!("Sharpe:         {:.3}", m.sharpe_ratio);
    println!("Sortino:        {:.3}", m.sortino_ratio);
    println!("Max Drawdown:   {:.2}%", m.max_drawdown_pct);
    println!("Win Rate:       {:.1}%", m.win_rate * 100.0);
    println!("Profit Factor:  {:.2}", m.profit_factor);
    println!("Expectancy:     {:.2}", m.expectancy);
    println!("Avg MAE / MFE:  {:.2}% / {:.2}%", m.avg_mae * 100.0, m.avg_mfe * 100.0);
    println!("Max Consec Win: {}", m.max_consecutive_wins);
    println!("Max Consec Loss:{}", m.max_consecutive_losses);
    println!("Commission:     {:.2}", m.total_commission);
    println!("Slippage:       {:.2}", m.total_slippage);
    println!();
}

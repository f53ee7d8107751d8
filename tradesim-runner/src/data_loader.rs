//! Bar loading for the runner.
//!
//! Sources:
//! - CSV files (`timestamp,open,high,low,close,volume`; `date` accepted as an
//!   alias, values either RFC 3339 or `YYYY-MM-DD`)
//! - Parquet files written by `write_parquet`
//! - Synthetic random walks, deterministic per symbol, for demos and tests
//!
//! Every source validates through `BarSeries::new`; nothing here repairs gaps
//! or reorders bars.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc, Weekday};
use polars::prelude::*;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};
use tradesim_core::domain::{Bar, BarError, BarSeries, Timeframe};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no historical data available for symbol {symbol}")]
    NoData { symbol: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("parquet error: {0}")]
    Parquet(String),

    #[error("row {row}: unparseable timestamp '{value}'")]
    Timestamp { row: usize, value: String },

    #[error("invalid bar series: {0}")]
    InvalidSeries(#[from] BarError),

    #[error("unsupported data file {0} (expected .csv or .parquet)")]
    UnsupportedFormat(PathBuf),
}

/// Anything that can produce a validated series for a symbol.
pub trait BarSource: Send + Sync {
    fn load(&self, symbol: &str, timeframe: Timeframe) -> Result<BarSeries, LoadError>;

    fn name(&self) -> &str;
}

// ─── File sources ───────────────────────────────────────────────────

/// A single CSV or Parquet file holding one symbol's bars.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BarSource for FileSource {
    fn load(&self, symbol: &str, timeframe: Timeframe) -> Result<BarSeries, LoadError> {
        load_file(&self.path, symbol, timeframe)
    }

    fn name(&self) -> &str {
        "file"
    }
}

/// `{dir}/{SYMBOL}.parquet` or `{dir}/{SYMBOL}.csv`, Parquet preferred.
#[derive(Debug, Clone)]
pub struct DataDirSource {
    dir: PathBuf,
}

impl DataDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl BarSource for DataDirSource {
    fn load(&self, symbol: &str, timeframe: Timeframe) -> Result<BarSeries, LoadError> {
        for ext in ["parquet", "csv"] {
            let path = self.dir.join(format!("{symbol}.{ext}"));
            if path.is_file() {
                return load_file(&path, symbol, timeframe);
            }
        }
        Err(LoadError::NoData {
            symbol: symbol.to_string(),
        })
    }

    fn name(&self) -> &str {
        "data-dir"
    }
}

fn load_file(path: &Path, symbol: &str, timeframe: Timeframe) -> Result<BarSeries, LoadError> {
    let bars = match path.extension().and_then(|s| s.to_str()) {
        Some("csv") => read_csv(path)?,
        Some("parquet") => read_parquet(path)?,
        _ => return Err(LoadError::UnsupportedFormat(path.to_path_buf())),
    };
    if bars.is_empty() {
        return Err(LoadError::NoData {
            symbol: symbol.to_string(),
        });
    }
    debug!(symbol, path = %path.display(), bars = bars.len(), "loaded bars");
    Ok(BarSeries::new(symbol, timeframe, bars)?)
}

// ─── CSV ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "date")]
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Read bars from a CSV file with a header row.
pub fn read_csv(path: &Path) -> Result<Vec<Bar>, LoadError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut bars = Vec::new();
    for (row, record) in reader.deserialize::<CsvRow>().enumerate() {
        let r = record?;
        let timestamp = parse_timestamp(&r.timestamp).ok_or_else(|| LoadError::Timestamp {
            row: row + 1,
            value: r.timestamp.clone(),
        })?;
        bars.push(Bar::new(timestamp, r.open, r.high, r.low, r.close, r.volume));
    }
    Ok(bars)
}

/// Write a series in the format `read_csv` accepts (RFC 3339 timestamps).
pub fn write_csv(series: &BarSeries, path: &Path) -> Result<(), LoadError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["timestamp", "open", "high", "low", "close", "volume"])?;
    for b in series.bars() {
        wtr.write_record([
            b.timestamp.to_rfc3339(),
            b.open.to_string(),
            b.high.to_string(),
            b.low.to_string(),
            b.close.to_string(),
            b.volume.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write CSV or Parquet by extension.
pub fn write_series(series: &BarSeries, path: &Path) -> Result<(), LoadError> {
    match path.extension().and_then(|s| s.to_str()) {
        Some("csv") => write_csv(series, path),
        Some("parquet") => write_parquet(series, path),
        _ => Err(LoadError::UnsupportedFormat(path.to_path_buf())),
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

// ─── Parquet ────────────────────────────────────────────────────────

/// Persist a series as Parquet (`timestamp` in epoch milliseconds).
///
/// Atomic: write to `.tmp`, then rename into place.
pub fn write_parquet(series: &BarSeries, path: &Path) -> Result<(), LoadError> {
    let bars = series.bars();
    let mut df = DataFrame::new(vec![
        Column::new(
            "timestamp".into(),
            bars.iter().map(|b| b.timestamp.timestamp_millis()).collect::<Vec<i64>>(),
        ),
        Column::new("open".into(), bars.iter().map(|b| b.open).collect::<Vec<f64>>()),
        Column::new("high".into(), bars.iter().map(|b| b.high).collect::<Vec<f64>>()),
        Column::new("low".into(), bars.iter().map(|b| b.low).collect::<Vec<f64>>()),
        Column::new("close".into(), bars.iter().map(|b| b.close).collect::<Vec<f64>>()),
        Column::new("volume".into(), bars.iter().map(|b| b.volume).collect::<Vec<f64>>()),
    ])
    .map_err(|e| LoadError::Parquet(format!("dataframe creation: {e}")))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("parquet.tmp");
    let file = fs::File::create(&tmp_path)?;
    ParquetWriter::new(file)
        .finish(&mut df)
        .map_err(|e| LoadError::Parquet(format!("write parquet: {e}")))?;
    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        LoadError::Io(e)
    })?;
    Ok(())
}

/// Read bars from a Parquet file written by `write_parquet`.
pub fn read_parquet(path: &Path) -> Result<Vec<Bar>, LoadError> {
    let file = fs::File::open(path)?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| LoadError::Parquet(format!("read: {e}")))?;

    let map_err = |e: PolarsError| LoadError::Parquet(format!("column read: {e}"));
    let ts = df.column("timestamp").map_err(map_err)?.i64().map_err(map_err)?;
    let f64_col = |name: &str| -> Result<Vec<f64>, LoadError> {
        let ca = df.column(name).map_err(map_err)?.f64().map_err(map_err)?;
        Ok(ca.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    };
    let opens = f64_col("open")?;
    let highs = f64_col("high")?;
    let lows = f64_col("low")?;
    let closes = f64_col("close")?;
    let volumes = f64_col("volume")?;

    let mut bars = Vec::with_capacity(df.height());
    for (i, millis) in ts.into_iter().enumerate() {
        let timestamp = millis
            .and_then(DateTime::from_timestamp_millis)
            .ok_or_else(|| LoadError::Timestamp {
                row: i + 1,
                value: format!("{millis:?}"),
            })?;
        bars.push(Bar::new(timestamp, opens[i], highs[i], lows[i], closes[i], volumes[i]));
    }
    Ok(bars)
}

// ─── Synthetic ──────────────────────────────────────────────────────

/// Deterministic random walk between two dates.
///
/// The RNG is seeded from the BLAKE3 hash of the symbol, so the same symbol
/// always yields the same bars. Daily and weekly bars skip weekends.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    start: NaiveDate,
    end: NaiveDate,
}

impl SyntheticSource {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }
}

impl BarSource for SyntheticSource {
    fn load(&self, symbol: &str, timeframe: Timeframe) -> Result<BarSeries, LoadError> {
        warn!(symbol, "generating synthetic data; results are not market data");
        let bars = generate_synthetic_bars(symbol, timeframe, self.start, self.end);
        if bars.is_empty() {
            return Err(LoadError::NoData {
                symbol: symbol.to_string(),
            });
        }
        Ok(BarSeries::new(symbol, timeframe, bars)?)
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}

fn bar_step(timeframe: Timeframe) -> Duration {
    match timeframe {
        Timeframe::Minute1 => Duration::minutes(1),
        Timeframe::Minute5 => Duration::minutes(5),
        Timeframe::Minute15 => Duration::minutes(15),
        Timeframe::Minute30 => Duration::minutes(30),
        Timeframe::Hour1 => Duration::hours(1),
        Timeframe::Hour4 => Duration::hours(4),
        Timeframe::Day1 => Duration::days(1),
        Timeframe::Week1 => Duration::weeks(1),
    }
}

pub fn generate_synthetic_bars(
    symbol: &str,
    timeframe: Timeframe,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<Bar> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let (Some(first), Some(last)) = (start.and_hms_opt(0, 0, 0), end.and_hms_opt(23, 59, 59))
    else {
        return Vec::new();
    };
    let mut current = Utc.from_utc_datetime(&first);
    let last = Utc.from_utc_datetime(&last);
    let step = bar_step(timeframe);

    let mut bars = Vec::new();
    let mut price = 100.0_f64;
    while current <= last {
        let weekday = current.weekday();
        if weekday == Weekday::Sat || weekday == Weekday::Sun {
            current += step;
            continue;
        }

        let bar_return: f64 = rng.gen_range(-0.03..0.03);
        let open = price;
        let close = price * (1.0 + bar_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(500_000..5_000_000u64) as f64;
        bars.push(Bar::new(current, open, high, low, close, volume));

        price = close;
        current += step;
    }

    bars
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn synthetic_is_deterministic_per_symbol() {
        let a = generate_synthetic_bars("SPY", Timeframe::Day1, d(2023, 1, 1), d(2023, 3, 31));
        let b = generate_synthetic_bars("SPY", Timeframe::Day1, d(2023, 1, 1), d(2023, 3, 31));
        let c = generate_synthetic_bars("QQQ", Timeframe::Day1, d(2023, 1, 1), d(2023, 3, 31));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.iter().all(|bar| bar.is_sane()));
        assert!(a
            .iter()
            .all(|bar| !matches!(bar.timestamp.weekday(), Weekday::Sat | Weekday::Sun)));
    }

    #[test]
    fn synthetic_source_validates() {
        let series = SyntheticSource::new(d(2022, 1, 1), d(2022, 12, 31))
            .load("SPY", Timeframe::Day1)
            .unwrap();
        assert_eq!(series.symbol(), "SPY");
        assert_eq!(series.len(), 260);
    }

    #[test]
    fn synthetic_empty_range_is_no_data() {
        // Saturday and Sunday only.
        let err = SyntheticSource::new(d(2024, 1, 6), d(2024, 1, 7))
            .load("SPY", Timeframe::Day1)
            .unwrap_err();
        assert_eq!(err.to_string(), "no historical data available for symbol SPY");
    }

    #[test]
    fn csv_roundtrip_with_date_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("SPY.csv");
        fs::write(
            &path,
            "date,open,high,low,close,volume\n\
             2024-01-02,100,101,99,100.5,1000\n\
             2024-01-03T00:00:00Z,100.5,102,100,101.5,1200\n",
        )
        .unwrap();
        let series = FileSource::new(&path).load("SPY", Timeframe::Day1).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.bars()[1].close, 101.5);
        assert_eq!(series.bars()[0].date(), d(2024, 1, 2));
    }

    #[test]
    fn csv_bad_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("X.csv");
        fs::write(&path, "timestamp,open,high,low,close,volume\nyesterday,1,1,1,1,1\n").unwrap();
        assert!(matches!(read_csv(&path), Err(LoadError::Timestamp { row: 1, .. })));
    }

    #[test]
    fn csv_unsorted_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("X.csv");
        fs::write(
            &path,
            "timestamp,open,high,low,close,volume\n2024-01-03,1,1,1,1,1\n2024-01-02,1,1,1,1,1\n",
        )
        .unwrap();
        assert!(matches!(
            FileSource::new(&path).load("X", Timeframe::Day1),
            Err(LoadError::InvalidSeries(BarError::NonIncreasingTimestamp { .. }))
        ));
    }

    #[test]
    fn empty_csv_is_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("X.csv");
        fs::write(&path, "timestamp,open,high,low,close,volume\n").unwrap();
        assert!(matches!(
            FileSource::new(&path).load("X", Timeframe::Day1),
            Err(LoadError::NoData { .. })
        ));
    }

    #[test]
    fn parquet_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("SPY.parquet");
        let series = SyntheticSource::new(d(2023, 1, 1), d(2023, 6, 30))
            .load("SPY", Timeframe::Day1)
            .unwrap();
        write_parquet(&series, &path).unwrap();
        assert!(!path.with_extension("parquet.tmp").exists());

        let loaded = DataDirSource::new(dir.path()).load("SPY", Timeframe::Day1).unwrap();
        assert_eq!(loaded, series);
        assert_eq!(loaded.content_hash(), series.content_hash());
    }

    #[test]
    fn written_csv_reads_back_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("QQQ.csv");
        let series = SyntheticSource::new(d(2023, 1, 1), d(2023, 2, 28))
            .load("QQQ", Timeframe::Day1)
            .unwrap();
        write_series(&series, &path).unwrap();

        let loaded = DataDirSource::new(dir.path()).load("QQQ", Timeframe::Day1).unwrap();
        assert_eq!(loaded, series);
        assert!(matches!(
            write_series(&series, &dir.path().join("QQQ.json")),
            Err(LoadError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn data_dir_missing_symbol() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            DataDirSource::new(dir.path()).load("NOPE", Timeframe::Day1),
            Err(LoadError::NoData { .. })
        ));
    }

    #[test]
    fn unsupported_extension() {
        assert!(matches!(
            FileSource::new("bars.xlsx").load("X", Timeframe::Day1),
            Err(LoadError::UnsupportedFormat(_))
        ));
    }
}

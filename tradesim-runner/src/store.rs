//! Run records and their persistence.
//!
//! A run is recorded RUNNING before simulation starts and transitions exactly
//! once to COMPLETED or FAILED. Nothing mid-run is persisted, so after a
//! restart any record still RUNNING is abandoned: `recover_abandoned` marks it
//! FAILED instead of resuming it.
//!
//! `JsonRunStore` keeps one JSON file per run under a directory. Writes are
//! atomic: write to `.tmp`, then rename into place.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use tradesim_core::domain::Timeframe;

use crate::result::ResultSummary;

/// Message stored on runs found RUNNING after a restart.
pub const ABANDONED_MESSAGE: &str = "abandoned: process restarted before completion";

/// Hex characters in a run id.
pub const RUN_ID_LEN: usize = 16;

/// Run identifier (hex BLAKE3 prefix).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    /// Digest of the request plus a submission sequence number, so repeated
    /// submissions of the same request get distinct ids.
    pub fn derive(
        strategy_id: &str,
        symbol: &str,
        range: &DateRange,
        timeframe: Timeframe,
        sequence: u64,
    ) -> Self {
        let mut hasher = blake3::Hasher::new();
        for part in [strategy_id, symbol, timeframe.as_str()] {
            hasher.update(part.as_bytes());
            hasher.update(&[0]);
        }
        hasher.update(range.start.to_string().as_bytes());
        hasher.update(range.end.to_string().as_bytes());
        hasher.update(&sequence.to_le_bytes());
        hasher.update(&Utc::now().timestamp_nanos_opt().unwrap_or_default().to_le_bytes());
        let hex = hasher.finalize().to_hex();
        RunId(hex[..RUN_ID_LEN].to_string())
    }

    /// Parses a user-supplied id: exactly 16 lowercase hex characters.
    pub fn parse(s: &str) -> Result<Self, StoreError> {
        let id = RunId(s.to_string());
        if id.is_well_formed() {
            Ok(id)
        } else {
            Err(StoreError::InvalidId(s.to_string()))
        }
    }

    pub fn is_well_formed(&self) -> bool {
        self.0.len() == RUN_ID_LEN
            && self.0.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// Inclusive calendar-date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            RunStatus::Running => "RUNNING",
            RunStatus::Completed => "COMPLETED",
            RunStatus::Failed => "FAILED",
        })
    }
}

/// Persisted record of one backtest request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestRun {
    pub id: RunId,
    pub status: RunStatus,
    pub strategy_id: String,
    pub symbol: String,
    pub date_range: DateRange,
    pub timeframe: Timeframe,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub result_summary: Option<ResultSummary>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl BacktestRun {
    pub fn running(
        id: RunId,
        strategy_id: impl Into<String>,
        symbol: impl Into<String>,
        date_range: DateRange,
        timeframe: Timeframe,
    ) -> Self {
        Self {
            id,
            status: RunStatus::Running,
            strategy_id: strategy_id.into(),
            symbol: symbol.into(),
            date_range,
            timeframe,
            created_at: Utc::now(),
            finished_at: None,
            result_summary: None,
            error_message: None,
        }
    }

    fn complete(&mut self, summary: ResultSummary) -> Result<(), StoreError> {
        self.ensure_running()?;
        self.status = RunStatus::Completed;
        self.result_summary = Some(summary);
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    fn fail(&mut self, message: &str) -> Result<(), StoreError> {
        self.ensure_running()?;
        self.status = RunStatus::Failed;
        self.error_message = Some(message.to_string());
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    fn ensure_running(&self) -> Result<(), StoreError> {
        if self.status.is_terminal() {
            return Err(StoreError::AlreadyTerminal {
                id: self.id.clone(),
                status: self.status,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("run {0} not found")]
    NotFound(RunId),

    #[error("run {0} already exists")]
    Duplicate(RunId),

    #[error("run {id} is already {status}")]
    AlreadyTerminal { id: RunId, status: RunStatus },

    #[error("invalid run id '{0}': expected 16 hex characters")]
    InvalidId(String),

    #[error("new runs must start RUNNING, got {0}")]
    NotRunning(RunStatus),

    #[error("run store I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("run record serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Persistence for run records. Terminal transitions happen exactly once.
pub trait RunStore: Send + Sync {
    fn create_running(&self, run: &BacktestRun) -> Result<(), StoreError>;

    fn complete(&self, id: &RunId, summary: ResultSummary) -> Result<(), StoreError>;

    fn fail(&self, id: &RunId, message: &str) -> Result<(), StoreError>;

    fn get(&self, id: &RunId) -> Result<Option<BacktestRun>, StoreError>;

    /// All runs, oldest first.
    fn list(&self) -> Result<Vec<BacktestRun>, StoreError>;

    /// Mark every RUNNING record FAILED. Returns the ids that were changed.
    fn recover_abandoned(&self) -> Result<Vec<RunId>, StoreError> {
        let mut recovered = Vec::new();
        for run in self.list()? {
            if run.status == RunStatus::Running {
                self.fail(&run.id, ABANDONED_MESSAGE)?;
                warn!(run = %run.id, symbol = %run.symbol, "marked abandoned run as failed");
                recovered.push(run.id);
            }
        }
        Ok(recovered)
    }
}

// ─── In-memory store ────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct InMemoryRunStore {
    runs: Mutex<BTreeMap<RunId, BacktestRun>>,
}

impl InMemoryRunStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn update(
        &self,
        id: &RunId,
        f: impl FnOnce(&mut BacktestRun) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let mut runs = self.runs.lock().unwrap_or_else(PoisonError::into_inner);
        let run = runs
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        f(run)
    }
}

impl RunStore for InMemoryRunStore {
    fn create_running(&self, run: &BacktestRun) -> Result<(), StoreError> {
        if run.status != RunStatus::Running {
            return Err(StoreError::NotRunning(run.status));
        }
        let mut runs = self.runs.lock().unwrap_or_else(PoisonError::into_inner);
        if runs.contains_key(&run.id) {
            return Err(StoreError::Duplicate(run.id.clone()));
        }
        runs.insert(run.id.clone(), run.clone());
        Ok(())
    }

    fn complete(&self, id: &RunId, summary: ResultSummary) -> Result<(), StoreError> {
        self.update(id, |run| run.complete(summary))
    }

    fn fail(&self, id: &RunId, message: &str) -> Result<(), StoreError> {
        self.update(id, |run| run.fail(message))
    }

    fn get(&self, id: &RunId) -> Result<Option<BacktestRun>, StoreError> {
        let runs = self.runs.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(runs.get(id).cloned())
    }

    fn list(&self) -> Result<Vec<BacktestRun>, StoreError> {
        let runs = self.runs.lock().unwrap_or_else(PoisonError::into_inner);
        let mut all: Vec<BacktestRun> = runs.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }
}

// ─── JSON file store ────────────────────────────────────────────────

/// One `{id}.json` file per run.
#[derive(Debug, Clone)]
pub struct JsonRunStore {
    dir: PathBuf,
}

impl JsonRunStore {
    /// Opens a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn run_path(&self, id: &RunId) -> Result<PathBuf, StoreError> {
        if !id.is_well_formed() {
            return Err(StoreError::InvalidId(id.0.clone()));
        }
        Ok(self.dir.join(format!("{id}.json")))
    }

    fn read(&self, path: &Path) -> Result<BacktestRun, StoreError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    fn write(&self, run: &BacktestRun) -> Result<(), StoreError> {
        let path = self.run_path(&run.id)?;
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, serde_json::to_vec_pretty(run)?)?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            StoreError::Io(e)
        })?;
        debug!(run = %run.id, status = %run.status, "run record written");
        Ok(())
    }

    fn update(
        &self,
        id: &RunId,
        f: impl FnOnce(&mut BacktestRun) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let mut run = self.get(id)?.ok_or_else(|| StoreError::NotFound(id.clone()))?;
        f(&mut run)?;
        self.write(&run)
    }
}

impl RunStore for JsonRunStore {
    fn create_running(&self, run: &BacktestRun) -> Result<(), StoreError> {
        if run.status != RunStatus::Running {
            return Err(StoreError::NotRunning(run.status));
        }
        if self.run_path(&run.id)?.exists() {
            return Err(StoreError::Duplicate(run.id.clone()));
        }
        self.write(run)
    }

    fn complete(&self, id: &RunId, summary: ResultSummary) -> Result<(), StoreError> {
        self.update(id, |run| run.complete(summary))
    }

    fn fail(&self, id: &RunId, message: &str) -> Result<(), StoreError> {
        self.update(id, |run| run.fail(message))
    }

    fn get(&self, id: &RunId) -> Result<Option<BacktestRun>, StoreError> {
        let path = self.run_path(id)?;
        if !path.exists() {
            return Ok(None);
        }
        self.read(&path).map(Some)
    }

    /// Skips unreadable files (logged but not fatal).
    fn list(&self) -> Result<Vec<BacktestRun>, StoreError> {
        let mut all = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            match self.read(&path) {
                Ok(run) => all.push(run),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable run record"),
            }
        }
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }
}

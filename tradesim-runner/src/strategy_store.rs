//! Strategy lookup by id.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tradesim_core::engine::StrategyDefinition;

use crate::config::{parse_strategy, read, ConfigError};

/// Read-only source of strategy definitions.
pub trait StrategyStore: Send + Sync {
    /// `Ok(None)` when no strategy has this id.
    fn get(&self, id: &str) -> Result<Option<StrategyDefinition>, ConfigError>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStrategyStore {
    strategies: BTreeMap<String, StrategyDefinition>,
}

impl InMemoryStrategyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, strategy: StrategyDefinition) {
        self.strategies.insert(strategy.id.clone(), strategy);
    }
}

impl FromIterator<StrategyDefinition> for InMemoryStrategyStore {
    fn from_iter<I: IntoIterator<Item = StrategyDefinition>>(iter: I) -> Self {
        let mut store = Self::new();
        for strategy in iter {
            store.insert(strategy);
        }
        store
    }
}

impl StrategyStore for InMemoryStrategyStore {
    fn get(&self, id: &str) -> Result<Option<StrategyDefinition>, ConfigError> {
        Ok(self.strategies.get(id).cloned())
    }
}

/// Strategies stored as `{dir}/{id}.toml`.
#[derive(Debug, Clone)]
pub struct DirStrategyStore {
    dir: PathBuf,
}

impl DirStrategyStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl StrategyStore for DirStrategyStore {
    fn get(&self, id: &str) -> Result<Option<StrategyDefinition>, ConfigError> {
        // Ids never address files outside the store directory.
        if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
            return Ok(None);
        }
        let path = self.dir.join(format!("{id}.toml"));
        if !path.is_file() {
            return Ok(None);
        }
        let strategy = parse_strategy(&read(&path)?)?;
        if strategy.id != id {
            return Err(ConfigError::IdMismatch {
                path,
                expected: id.to_string(),
                found: strategy.id,
            });
        }
        Ok(Some(strategy))
    }
}

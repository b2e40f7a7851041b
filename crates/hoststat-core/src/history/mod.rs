//! Capacity-bounded sample history.
//!
//! Two back-ends share the [`HistoryStore`] contract:
//! - [`MemoryHistory`]: fixed slot ring buffer, lost on restart.
//! - [`SqliteHistory`]: one table, every append committed durably and
//!   trimmed in the same transaction.
//!
//! In both, retention is enforced on every append: the stored count never
//! exceeds the capacity, and eviction is strictly oldest-first by insertion
//! order.

mod memory;
mod sqlite;

use std::path::{Path, PathBuf};

pub use memory::MemoryHistory;
pub use sqlite::SqliteHistory;

use crate::error::{ConfigError, Result, StoreResult};
use crate::sample::Sample;

/// Default capacity when history lives only in memory.
pub const MEMORY_CAPACITY: usize = 100;

/// Default capacity when history is persisted.
pub const PERSISTED_CAPACITY: usize = 1000;

/// Ordered, capacity-bounded sample storage.
pub trait HistoryStore: Send {
    /// Add `sample` as the newest entry, then evict the oldest entries until
    /// the count is back within capacity. On error nothing is changed.
    fn append(&mut self, sample: Sample) -> StoreResult<()>;

    /// The last `min(n, len)` samples, oldest first.
    fn read_recent(&self, n: usize) -> StoreResult<Vec<Sample>>;

    fn len(&self) -> StoreResult<usize>;

    fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    fn capacity(&self) -> usize;

    /// Short back-end name for health output.
    fn backend(&self) -> &'static str;
}

impl<H: HistoryStore + ?Sized> HistoryStore for Box<H> {
    fn append(&mut self, sample: Sample) -> StoreResult<()> {
        (**self).append(sample)
    }

    fn read_recent(&self, n: usize) -> StoreResult<Vec<Sample>> {
        (**self).read_recent(n)
    }

    fn len(&self) -> StoreResult<usize> {
        (**self).len()
    }

    fn capacity(&self) -> usize {
        (**self).capacity()
    }

    fn backend(&self) -> &'static str {
        (**self).backend()
    }
}

/// Where history is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Memory,
    Sqlite(PathBuf),
}

/// Store construction parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryConfig {
    pub capacity: usize,
    pub backend: Backend,
}

impl HistoryConfig {
    pub fn memory() -> Self {
        Self {
            capacity: MEMORY_CAPACITY,
            backend: Backend::Memory,
        }
    }

    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self {
            capacity: PERSISTED_CAPACITY,
            backend: Backend::Sqlite(path.into()),
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if let Backend::Sqlite(path) = &self.backend {
            validate_db_path(path)?;
        }
        Ok(())
    }
}

fn validate_db_path(path: &Path) -> std::result::Result<(), ConfigError> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::EmptyPath);
    }
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => {
            Err(ConfigError::MissingParent {
                path: path.to_path_buf(),
            })
        }
        _ => Ok(()),
    }
}

/// Validate `config` and open the matching store.
pub fn open_history(config: &HistoryConfig) -> Result<Box<dyn HistoryStore>> {
    config.validate()?;
    Ok(match &config.backend {
        Backend::Memory => Box::new(MemoryHistory::new(config.capacity)?),
        Backend::Sqlite(path) => Box::new(SqliteHistory::open(path, config.capacity)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn defaults_match_backend() {
        assert_eq!(HistoryConfig::memory().capacity, 100);
        assert_eq!(HistoryConfig::sqlite("stats.db").capacity, 1000);
    }

    #[test]
    fn zero_capacity_is_config_error() {
        let err = open_history(&HistoryConfig::memory().with_capacity(0)).err().unwrap();
        assert!(matches!(err, Error::Config(ConfigError::ZeroCapacity)));
    }

    #[test]
    fn empty_path_is_config_error() {
        assert_eq!(
            HistoryConfig::sqlite("").validate(),
            Err(ConfigError::EmptyPath)
        );
    }

    #[test]
    fn missing_parent_is_config_error() {
        let cfg = HistoryConfig::sqlite("/nonexistent/hoststat/dir/stats.db");
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::MissingParent { .. })
        ));
    }

    #[test]
    fn bare_filename_is_valid() {
        assert!(HistoryConfig::sqlite("stats.db").validate().is_ok());
    }

    #[test]
    fn open_reports_backend() {
        let store = open_history(&HistoryConfig::memory()).unwrap();
        assert_eq!(store.backend(), "memory");
        assert_eq!(store.capacity(), MEMORY_CAPACITY);

        let dir = tempfile::tempdir().unwrap();
        let store = open_history(&HistoryConfig::sqlite(dir.path().join("h.db"))).unwrap();
        assert_eq!(store.backend(), "sqlite");
        assert_eq!(store.capacity(), PERSISTED_CAPACITY);
    }
}

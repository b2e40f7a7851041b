//! Error taxonomy.
//!
//! - [`SensorUnavailable`] is absorbed inside the collector and never reaches
//!   a caller as a failure.
//! - [`StoreError`] always propagates to the request boundary.
//! - [`ConfigError`] is only produced while opening a store at startup.

use std::path::PathBuf;

use thiserror::Error;

use crate::source::MetricKind;

/// One metric could not be read on this cycle.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{metric} unavailable: {reason}")]
pub struct SensorUnavailable {
    pub metric: MetricKind,
    pub reason: String,
}

impl SensorUnavailable {
    pub fn new(metric: MetricKind, reason: impl Into<String>) -> Self {
        Self {
            metric,
            reason: reason.into(),
        }
    }
}

/// The history store could not be opened, written or read.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("corrupt row {id}: {reason}")]
    Corrupt { id: i64, reason: String },

    #[error("{field} value {value} does not fit the store")]
    OutOfRange { field: &'static str, value: u64 },

    #[error("history lock poisoned by a panicked request")]
    Poisoned,
}

/// Invalid store configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("history capacity must be at least 1")]
    ZeroCapacity,

    #[error("history database path is empty")]
    EmptyPath,

    #[error("parent directory of {path} does not exist")]
    MissingParent { path: PathBuf },

    #[error("cpu sampling window must be between {min_ms} and {max_ms} ms, got {got_ms} ms")]
    InvalidWindow { got_ms: u64, min_ms: u64, max_ms: u64 },
}

/// Crate-level error.
#[derive(Error, Debug)]
pub enum Error {
    #[error("store unavailable: {0}")]
    Store(#[from] StoreError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

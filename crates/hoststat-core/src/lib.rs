//! # hoststat-core
//!
//! Host telemetry sampling with a capacity-bounded history.
//!
//! Each call to [`SnapshotService::handle_request`] reads every metric once,
//! appends the resulting [`Sample`] to a [`HistoryStore`], and returns the
//! retained window as parallel arrays ready for JSON.
//!
//! ```no_run
//! use hoststat_core::{HistoryConfig, HostSource, HostSourceConfig, SampleCollector,
//!     SnapshotService, open_history};
//!
//! let source = HostSource::new(HostSourceConfig::default()).unwrap();
//! let store = open_history(&HistoryConfig::memory()).unwrap();
//! let service = SnapshotService::new(SampleCollector::new(Box::new(source)), store).unwrap();
//!
//! let snapshot = service.handle_request().unwrap();
//! println!("{}", serde_json::to_string(&snapshot).unwrap());
//! ```
//!
//! ## Architecture
//!
//! MetricSource → SampleCollector → HistoryStore → SnapshotResponse
//!
//! Sensors are unreliable: a metric that cannot be read becomes
//! [`Reading::Unavailable`] for that sample and serializes as `"N/A"`.
//! Store failures are real errors and propagate to the caller.

pub mod collector;
pub mod error;
pub mod history;
pub mod reading;
pub mod sample;
pub mod service;
pub mod source;
pub mod sources;

pub use collector::SampleCollector;
pub use error::{ConfigError, Error, Result, SensorUnavailable, StoreError, StoreResult};
pub use history::{
    Backend, HistoryConfig, HistoryStore, MEMORY_CAPACITY, MemoryHistory, PERSISTED_CAPACITY,
    SqliteHistory, open_history,
};
pub use reading::{Reading, UNAVAILABLE_MARKER};
pub use sample::{Collected, Sample, TimestampFormat};
pub use service::{SnapshotResponse, SnapshotService, StoreStatus};
pub use source::{MetricKind, MetricSource};
pub use sources::{DEFAULT_CPU_WINDOW, HostSource, HostSourceConfig, MAX_CPU_WINDOW};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

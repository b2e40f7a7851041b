//! Request-facing snapshot cycle.
//!
//! Every request runs exactly one collect → append → read cycle. The whole
//! cycle holds one lock, so concurrent requests are serialized: each sees
//! its own sample as the newest entry and no append is lost or reordered.

use std::sync::Mutex;

use serde::Serialize;

use crate::collector::SampleCollector;
use crate::error::{StoreError, StoreResult};
use crate::history::HistoryStore;
use crate::reading::Reading;
use crate::sample::{Sample, TimestampFormat};

/// Parallel-array view of the history, oldest first.
///
/// Index `i` of every array belongs to the same sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotResponse {
    pub cpu_usage: Vec<Reading<f64>>,
    pub ram_usage: Vec<Reading<f64>>,
    pub disk_usage: Vec<Reading<f64>>,
    pub temperature: Vec<Reading<f64>>,
    pub timestamps: Vec<String>,
    pub cpu_speed: Vec<Reading<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpu_speed: Option<Vec<Reading<u64>>>,
    pub uptime: Reading<String>,
}

impl SnapshotResponse {
    pub fn from_samples(
        samples: &[Sample],
        uptime: Reading<String>,
        format: TimestampFormat,
        include_gpu: bool,
    ) -> Self {
        Self {
            cpu_usage: column(samples, |s| &s.cpu_usage),
            ram_usage: column(samples, |s| &s.ram_usage),
            disk_usage: column(samples, |s| &s.disk_usage),
            temperature: column(samples, |s| &s.temperature),
            timestamps: samples.iter().map(|s| format.render(&s.timestamp)).collect(),
            cpu_speed: column(samples, |s| &s.cpu_speed),
            gpu_speed: include_gpu.then(|| column(samples, |s| &s.gpu_speed)),
            uptime,
        }
    }

    /// Number of samples in the series.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

fn column<T: Clone>(samples: &[Sample], field: impl Fn(&Sample) -> &Reading<T>) -> Vec<Reading<T>> {
    samples.iter().map(|s| field(s).clone()).collect()
}

/// Store summary for health checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStatus {
    pub samples: usize,
    pub capacity: usize,
    pub backend: &'static str,
}

struct Cycle {
    collector: SampleCollector,
    store: Box<dyn HistoryStore>,
}

/// Owns the collector and the store; safe to share across threads.
pub struct SnapshotService {
    inner: Mutex<Cycle>,
    timestamp_format: TimestampFormat,
    include_gpu: bool,
}

impl SnapshotService {
    /// Wrap `collector` and `store`. New timestamps are kept at or after the
    /// newest stored sample so a persisted series stays ordered across
    /// restarts.
    pub fn new(mut collector: SampleCollector, store: Box<dyn HistoryStore>) -> StoreResult<Self> {
        if let Some(newest) = store.read_recent(1)?.pop() {
            collector.set_time_floor(newest.timestamp);
        }
        let include_gpu = collector.gpu_enabled();
        Ok(Self {
            inner: Mutex::new(Cycle { collector, store }),
            timestamp_format: TimestampFormat::default(),
            include_gpu,
        })
    }

    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    /// Collect one sample, append it, and return the full retained window.
    ///
    /// A store failure is returned as-is; nothing is appended in that case.
    pub fn handle_request(&self) -> StoreResult<SnapshotResponse> {
        let mut guard = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        let Cycle { collector, store } = &mut *guard;

        let collected = collector.collect();
        if let Err(e) = store.append(collected.sample) {
            log::warn!("history append failed: {e}");
            return Err(e);
        }
        let recent = store.read_recent(store.capacity())?;
        drop(guard);

        Ok(SnapshotResponse::from_samples(
            &recent,
            collected.uptime,
            self.timestamp_format,
            self.include_gpu,
        ))
    }

    pub fn status(&self) -> StoreResult<StoreStatus> {
        let guard = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(StoreStatus {
            samples: guard.store.len()?,
            capacity: guard.store.capacity(),
            backend: guard.store.backend(),
        })
    }
}

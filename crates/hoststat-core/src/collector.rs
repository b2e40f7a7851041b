//! One collection cycle: read every metric, absorb failures, stamp the time.

use chrono::{DateTime, Local};

use crate::error::SensorUnavailable;
use crate::reading::Reading;
use crate::sample::{Collected, Sample};
use crate::source::{MetricKind, MetricSource};

/// Drives a [`MetricSource`] through one full cycle per call.
///
/// Collection never fails as a whole: a sensor that errors or panics turns
/// into [`Reading::Unavailable`] for that metric only.
pub struct SampleCollector {
    source: Box<dyn MetricSource>,
    gpu_enabled: bool,
    clock: fn() -> DateTime<Local>,
    last_stamp: Option<DateTime<Local>>,
}

impl SampleCollector {
    pub fn new(source: Box<dyn MetricSource>) -> Self {
        Self {
            source,
            gpu_enabled: true,
            clock: Local::now,
            last_stamp: None,
        }
    }

    /// Skip the GPU probe entirely; `gpu_speed` is always unavailable.
    pub fn without_gpu(mut self) -> Self {
        self.gpu_enabled = false;
        self
    }

    pub fn with_clock(mut self, clock: fn() -> DateTime<Local>) -> Self {
        self.clock = clock;
        self
    }

    pub fn gpu_enabled(&self) -> bool {
        self.gpu_enabled
    }

    /// Never stamp a sample earlier than `floor`. Used to continue a
    /// persisted history across restarts and wall-clock steps.
    pub fn set_time_floor(&mut self, floor: DateTime<Local>) {
        self.last_stamp = Some(self.last_stamp.map_or(floor, |prev| prev.max(floor)));
    }

    fn guarded<T>(
        metric: MetricKind,
        read: impl FnOnce() -> Result<T, SensorUnavailable>,
    ) -> Reading<T> {
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(read)) {
            Ok(result) => Reading::from(result),
            Err(_) => {
                log::warn!("{metric} sensor panicked; reporting unavailable");
                Reading::Unavailable
            }
        }
    }

    fn stamp(&mut self) -> DateTime<Local> {
        let now = (self.clock)();
        let stamp = match self.last_stamp {
            Some(prev) if prev > now => prev,
            _ => now,
        };
        self.last_stamp = Some(stamp);
        stamp
    }

    /// Run one cycle.
    pub fn collect(&mut self) -> Collected {
        let source = &mut self.source;
        let cpu_usage = Self::guarded(MetricKind::CpuUsage, || source.read_cpu_usage());
        let ram_usage = Self::guarded(MetricKind::RamUsage, || source.read_memory_usage());
        let disk_usage = Self::guarded(MetricKind::DiskUsage, || source.read_disk_usage());
        let temperature = Self::guarded(MetricKind::Temperature, || source.read_temperature());
        let cpu_speed = Self::guarded(MetricKind::CpuSpeed, || source.read_cpu_clock_speed());
        let gpu_speed = if self.gpu_enabled {
            Self::guarded(MetricKind::GpuSpeed, || source.read_gpu_clock_speed())
        } else {
            Reading::Unavailable
        };
        let uptime = Self::guarded(MetricKind::Uptime, || source.read_uptime());

        let sample = Sample {
            timestamp: self.stamp(),
            cpu_usage,
            ram_usage,
            disk_usage,
            temperature,
            cpu_speed,
            gpu_speed,
        };
        log::debug!(
            "collected sample at {}: {} metrics available",
            sample.timestamp,
            sample.available_count()
        );
        Collected { sample, uptime }
    }
}

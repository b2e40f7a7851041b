//! Metric source trait and the metric catalogue.
//!
//! Every sensor back-end implements [`MetricSource`]: one read per
//! [`MetricKind`], each of which either yields a value in its documented
//! range or fails with [`SensorUnavailable`]. Reads are independent; one
//! failing never prevents the others from being attempted.

use crate::error::SensorUnavailable;

/// The metrics sampled on every cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// Busy CPU time over the sampling window, percent.
    CpuUsage,
    /// Used physical memory, percent.
    RamUsage,
    /// Used space on the monitored filesystem, percent.
    DiskUsage,
    /// CPU package / SoC temperature, degrees Celsius.
    Temperature,
    /// Current CPU clock, MHz.
    CpuSpeed,
    /// Current GPU core clock, MHz.
    GpuSpeed,
    /// Human-readable time since boot.
    Uptime,
}

impl MetricKind {
    pub const ALL: [MetricKind; 7] = [
        Self::CpuUsage,
        Self::RamUsage,
        Self::DiskUsage,
        Self::Temperature,
        Self::CpuSpeed,
        Self::GpuSpeed,
        Self::Uptime,
    ];

    /// Unit suffix used in logs.
    pub fn unit(self) -> &'static str {
        match self {
            Self::CpuUsage | Self::RamUsage | Self::DiskUsage => "%",
            Self::Temperature => "C",
            Self::CpuSpeed | Self::GpuSpeed => "MHz",
            Self::Uptime => "",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CpuUsage => write!(f, "cpu_usage"),
            Self::RamUsage => write!(f, "ram_usage"),
            Self::DiskUsage => write!(f, "disk_usage"),
            Self::Temperature => write!(f, "temperature"),
            Self::CpuSpeed => write!(f, "cpu_speed"),
            Self::GpuSpeed => write!(f, "gpu_speed"),
            Self::Uptime => write!(f, "uptime"),
        }
    }
}

/// Trait that every sensor back-end must implement.
///
/// Implementations may block for a bounded interval (the CPU read measures
/// over a window) but must not retry internally.
pub trait MetricSource: Send {
    fn read_cpu_usage(&mut self) -> Result<f64, SensorUnavailable>;

    fn read_memory_usage(&mut self) -> Result<f64, SensorUnavailable>;

    fn read_disk_usage(&mut self) -> Result<f64, SensorUnavailable>;

    fn read_temperature(&mut self) -> Result<f64, SensorUnavailable>;

    fn read_cpu_clock_speed(&mut self) -> Result<f64, SensorUnavailable>;

    fn read_gpu_clock_speed(&mut self) -> Result<u64, SensorUnavailable>;

    fn read_uptime(&mut self) -> Result<String, SensorUnavailable>;
}

impl<S: MetricSource + ?Sized> MetricSource for Box<S> {
    fn read_cpu_usage(&mut self) -> Result<f64, SensorUnavailable> {
        (**self).read_cpu_usage()
    }

    fn read_memory_usage(&mut self) -> Result<f64, SensorUnavailable> {
        (**self).read_memory_usage()
    }

    fn read_disk_usage(&mut self) -> Result<f64, SensorUnavailable> {
        (**self).read_disk_usage()
    }

    fn read_temperature(&mut self) -> Result<f64, SensorUnavailable> {
        (**self).read_temperature()
    }

    fn read_cpu_clock_speed(&mut self) -> Result<f64, SensorUnavailable> {
        (**self).read_cpu_clock_speed()
    }

    fn read_gpu_clock_speed(&mut self) -> Result<u64, SensorUnavailable> {
        (**self).read_gpu_clock_speed()
    }

    fn read_uptime(&mut self) -> Result<String, SensorUnavailable> {
        (**self).read_uptime()
    }
}

/// Slack allowed above 100% before a percentage is treated as garbage.
/// Some kernels report a hair over 100 while counters roll.
const PERCENT_TOLERANCE: f64 = 0.5;

/// Validate a percentage, clamping tiny overshoots into `[0, 100]`.
pub fn checked_percent(metric: MetricKind, value: f64) -> Result<f64, SensorUnavailable> {
    if !value.is_finite() {
        return Err(SensorUnavailable::new(metric, "non-finite value"));
    }
    if !(-PERCENT_TOLERANCE..=100.0 + PERCENT_TOLERANCE).contains(&value) {
        return Err(SensorUnavailable::new(
            metric,
            format!("{value} outside 0-100"),
        ));
    }
    Ok(value.clamp(0.0, 100.0))
}

/// Validate a strictly positive finite reading (clocks, most temperatures).
pub fn checked_positive(metric: MetricKind, value: f64) -> Result<f64, SensorUnavailable> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(SensorUnavailable::new(
            metric,
            format!("implausible reading {value}{}", metric.unit()),
        ))
    }
}

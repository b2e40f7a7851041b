//! The sample record and its timestamp rendering.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::reading::Reading;

/// One observation of the host at one instant.
///
/// Samples are immutable once appended to a history store. Every metric is a
/// [`Reading`], so a sample whose sensors all failed is still well-formed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Local>,
    pub cpu_usage: Reading<f64>,
    pub ram_usage: Reading<f64>,
    pub disk_usage: Reading<f64>,
    pub temperature: Reading<f64>,
    pub cpu_speed: Reading<f64>,
    pub gpu_speed: Reading<u64>,
}

impl Sample {
    /// A sample with every metric unavailable.
    pub fn unavailable(timestamp: DateTime<Local>) -> Self {
        Self {
            timestamp,
            cpu_usage: Reading::Unavailable,
            ram_usage: Reading::Unavailable,
            disk_usage: Reading::Unavailable,
            temperature: Reading::Unavailable,
            cpu_speed: Reading::Unavailable,
            gpu_speed: Reading::Unavailable,
        }
    }

    /// Number of metrics that carried a value.
    pub fn available_count(&self) -> usize {
        [
            self.cpu_usage.is_available(),
            self.ram_usage.is_available(),
            self.disk_usage.is_available(),
            self.temperature.is_available(),
            self.cpu_speed.is_available(),
            self.gpu_speed.is_available(),
        ]
        .into_iter()
        .filter(|&ok| ok)
        .count()
    }
}

/// Output of one collection cycle.
///
/// `uptime` is live-only: it is returned with the response that produced it
/// and never written to history.
#[derive(Debug, Clone, PartialEq)]
pub struct Collected {
    pub sample: Sample,
    pub uptime: Reading<String>,
}

/// How sample timestamps are rendered in responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampFormat {
    /// `HH:MM:SS`
    #[default]
    Time,
    /// `YYYY-MM-DD HH:MM:SS`
    DateTime,
}

impl TimestampFormat {
    fn pattern(self) -> &'static str {
        match self {
            Self::Time => "%H:%M:%S",
            Self::DateTime => "%Y-%m-%d %H:%M:%S",
        }
    }

    pub fn render(self, at: &DateTime<Local>) -> String {
        at.format(self.pattern()).to_string()
    }
}

impl std::str::FromStr for TimestampFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "time" => Ok(Self::Time),
            "datetime" | "date-time" => Ok(Self::DateTime),
            other => Err(format!(
                "unknown timestamp format '{other}' (expected time or datetime)"
            )),
        }
    }
}

//! HostSource: live sensors of the machine the process runs on.
//!
//! Built on `sysinfo` for CPU, memory, disk, temperature and CPU clock; GPU
//! clock and uptime text come from platform utilities via the helpers.

use std::path::PathBuf;
use std::time::Duration;

use sysinfo::{Components, CpuRefreshKind, Disks, MemoryRefreshKind, RefreshKind, System};

use super::helpers::{format_uptime, run_command};
use super::{gpu, thermal};
use crate::error::{ConfigError, SensorUnavailable};
use crate::source::{MetricKind, MetricSource, checked_percent, checked_positive};

/// Default CPU usage sampling window.
pub const DEFAULT_CPU_WINDOW: Duration = Duration::from_secs(1);

/// Longest window accepted; anything longer makes `/stats` unusably slow.
pub const MAX_CPU_WINDOW: Duration = Duration::from_secs(10);

/// Tunables for [`HostSource`].
#[derive(Debug, Clone)]
pub struct HostSourceConfig {
    /// Interval between the two CPU counter reads.
    pub cpu_window: Duration,
    /// Mount point whose filesystem usage is reported.
    pub disk_path: PathBuf,
}

impl Default for HostSourceConfig {
    fn default() -> Self {
        Self {
            cpu_window: DEFAULT_CPU_WINDOW,
            disk_path: PathBuf::from("/"),
        }
    }
}

impl HostSourceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let min = sysinfo::MINIMUM_CPU_UPDATE_INTERVAL;
        if self.cpu_window < min || self.cpu_window > MAX_CPU_WINDOW {
            return Err(ConfigError::InvalidWindow {
                got_ms: self.cpu_window.as_millis() as u64,
                min_ms: min.as_millis() as u64,
                max_ms: MAX_CPU_WINDOW.as_millis() as u64,
            });
        }
        Ok(())
    }
}

/// Metric source backed by the running host.
pub struct HostSource {
    config: HostSourceConfig,
    system: System,
    disks: Disks,
    components: Components,
}

impl HostSource {
    pub fn new(config: HostSourceConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let system = System::new_with_specifics(
            RefreshKind::new()
                .with_cpu(CpuRefreshKind::everything())
                .with_memory(MemoryRefreshKind::new().with_ram()),
        );
        Ok(Self {
            config,
            system,
            disks: Disks::new_with_refreshed_list(),
            components: Components::new_with_refreshed_list(),
        })
    }

    fn unavailable(metric: MetricKind, reason: impl Into<String>) -> SensorUnavailable {
        SensorUnavailable::new(metric, reason)
    }
}

impl MetricSource for HostSource {
    fn read_cpu_usage(&mut self) -> Result<f64, SensorUnavailable> {
        // Usage is a delta between two counter reads; the first refresh sets
        // the baseline, the second closes the window.
        self.system.refresh_cpu_usage();
        std::thread::sleep(self.config.cpu_window);
        self.system.refresh_cpu_usage();
        if self.system.cpus().is_empty() {
            return Err(Self::unavailable(MetricKind::CpuUsage, "no cpus reported"));
        }
        let usage = f64::from(self.system.global_cpu_info().cpu_usage());
        checked_percent(MetricKind::CpuUsage, usage)
    }

    fn read_memory_usage(&mut self) -> Result<f64, SensorUnavailable> {
        self.system.refresh_memory();
        let total = self.system.total_memory();
        if total == 0 {
            return Err(Self::unavailable(MetricKind::RamUsage, "total memory is 0"));
        }
        let used = self.system.used_memory();
        checked_percent(MetricKind::RamUsage, used as f64 / total as f64 * 100.0)
    }

    fn read_disk_usage(&mut self) -> Result<f64, SensorUnavailable> {
        self.disks.refresh_list();
        let disk = self
            .disks
            .list()
            .iter()
            .find(|d| d.mount_point() == self.config.disk_path.as_path())
            .ok_or_else(|| {
                Self::unavailable(
                    MetricKind::DiskUsage,
                    format!("no filesystem mounted at {}", self.config.disk_path.display()),
                )
            })?;
        let total = disk.total_space();
        if total == 0 {
            return Err(Self::unavailable(MetricKind::DiskUsage, "filesystem reports 0 bytes"));
        }
        let used = total.saturating_sub(disk.available_space());
        checked_percent(MetricKind::DiskUsage, used as f64 / total as f64 * 100.0)
    }

    fn read_temperature(&mut self) -> Result<f64, SensorUnavailable> {
        self.components.refresh_list();
        let from_components = thermal::pick_temperature(
            self.components
                .list()
                .iter()
                .map(|c| (c.label(), f64::from(c.temperature()))),
        );
        from_components
            .or_else(thermal::sysfs_temperature)
            .ok_or_else(|| Self::unavailable(MetricKind::Temperature, "no thermal sensor exposed"))
    }

    fn read_cpu_clock_speed(&mut self) -> Result<f64, SensorUnavailable> {
        self.system.refresh_cpu_frequency();
        let freqs: Vec<f64> = self
            .system
            .cpus()
            .iter()
            .map(|c| c.frequency() as f64)
            .filter(|&mhz| mhz > 0.0)
            .collect();
        if freqs.is_empty() {
            return Err(Self::unavailable(MetricKind::CpuSpeed, "no cpu frequency reported"));
        }
        let mean = freqs.iter().sum::<f64>() / freqs.len() as f64;
        checked_positive(MetricKind::CpuSpeed, mean)
    }

    fn read_gpu_clock_speed(&mut self) -> Result<u64, SensorUnavailable> {
        gpu::gpu_clock_mhz()
            .ok_or_else(|| Self::unavailable(MetricKind::GpuSpeed, "no gpu clock probe succeeded"))
    }

    fn read_uptime(&mut self) -> Result<String, SensorUnavailable> {
        if let Some(text) = run_command("uptime", &["-p"]) {
            return Ok(text);
        }
        match System::uptime() {
            0 => Err(Self::unavailable(MetricKind::Uptime, "uptime unknown")),
            secs => Ok(format_uptime(secs)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(HostSourceConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_window_is_rejected() {
        let config = HostSourceConfig {
            cpu_window: Duration::ZERO,
            ..HostSourceConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidWindow { got_ms: 0, .. })
        ));
    }

    #[test]
    fn huge_window_is_rejected() {
        let config = HostSourceConfig {
            cpu_window: Duration::from_secs(60),
            ..HostSourceConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn live_reads_are_in_range_or_unavailable() {
        let mut source = HostSource::new(HostSourceConfig {
            cpu_window: sysinfo::MINIMUM_CPU_UPDATE_INTERVAL,
            ..HostSourceConfig::default()
        })
        .unwrap();

        for pct in [
            source.read_cpu_usage(),
            source.read_memory_usage(),
            source.read_disk_usage(),
        ]
        .into_iter()
        .flatten()
        {
            assert!((0.0..=100.0).contains(&pct), "percent out of range: {pct}");
        }
        if let Ok(mhz) = source.read_cpu_clock_speed() {
            assert!(mhz > 0.0);
        }
        if let Ok(text) = source.read_uptime() {
            assert!(!text.is_empty());
        }
    }
}

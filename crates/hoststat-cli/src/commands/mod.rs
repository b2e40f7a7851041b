pub mod history;
pub mod sample;
pub mod serve;

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use hoststat_core::{HostSource, HostSourceConfig, SampleCollector};

/// Sensor options shared by commands that collect.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// CPU usage sampling window in milliseconds
    #[arg(long, default_value = "1000")]
    pub cpu_window_ms: u64,

    /// Mount point whose disk usage is reported
    #[arg(long, default_value = "/")]
    pub disk_path: PathBuf,

    /// Skip GPU clock probing
    #[arg(long)]
    pub no_gpu: bool,
}

impl SourceArgs {
    pub fn host_config(&self) -> HostSourceConfig {
        HostSourceConfig {
            cpu_window: Duration::from_millis(self.cpu_window_ms),
            disk_path: self.disk_path.clone(),
        }
    }

    /// Build the live collector, exiting on invalid options.
    pub fn collector(&self) -> SampleCollector {
        let source = HostSource::new(self.host_config()).unwrap_or_else(|e| exit_with(e));
        let collector = SampleCollector::new(Box::new(source));
        if self.no_gpu {
            collector.without_gpu()
        } else {
            collector
        }
    }
}

/// Print `err` and exit non-zero.
pub fn exit_with(err: impl std::fmt::Display) -> ! {
    eprintln!("Error: {err}");
    std::process::exit(1);
}

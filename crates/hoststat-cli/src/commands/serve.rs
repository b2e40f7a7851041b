use std::path::PathBuf;

use hoststat_core::{Backend, HistoryConfig, SnapshotService, TimestampFormat, open_history};

use super::{SourceArgs, exit_with};

pub struct ServeCommandConfig<'a> {
    pub host: &'a str,
    pub port: u16,
    pub capacity: Option<usize>,
    pub db: Option<PathBuf>,
    pub memory: bool,
    pub timestamp_format: TimestampFormat,
    pub source: &'a SourceArgs,
}

/// Persistence is off unless a database path is given and `memory` is not
/// set; capacity defaults per back-end.
pub fn history_config(
    db: Option<PathBuf>,
    memory: bool,
    capacity: Option<usize>,
) -> HistoryConfig {
    let config = match db {
        Some(path) if !memory => HistoryConfig::sqlite(path),
        _ => HistoryConfig::memory(),
    };
    match capacity {
        Some(n) => config.with_capacity(n),
        None => config,
    }
}

pub fn run(cfg: ServeCommandConfig<'_>) {
    // Everything that can fail on bad configuration happens before binding.
    let history = history_config(cfg.db, cfg.memory, cfg.capacity);
    let store = open_history(&history).unwrap_or_else(|e| exit_with(e));
    let collector = cfg.source.collector();
    let gpu = collector.gpu_enabled();
    let service = SnapshotService::new(collector, store)
        .unwrap_or_else(|e| exit_with(e))
        .with_timestamp_format(cfg.timestamp_format);

    let base = format!("http://{}:{}", cfg.host, cfg.port);
    println!("hoststat v{}", hoststat_core::VERSION);
    println!("   {base}");
    println!(
        "   history: {} (capacity {})",
        match &history.backend {
            Backend::Memory => "memory".to_string(),
            Backend::Sqlite(path) => path.display().to_string(),
        },
        history.capacity
    );
    println!(
        "   cpu window: {} ms, disk: {}, gpu: {}",
        cfg.source.cpu_window_ms,
        cfg.source.disk_path.display(),
        if gpu { "on" } else { "off" }
    );
    println!();
    println!("   Endpoints:");
    println!("     GET /         Dashboard");
    println!("     GET /stats    Collect one sample, return the retained window");
    println!("     GET /health   Store status");
    println!();

    let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| exit_with(e));
    if let Err(e) = rt.block_on(hoststat_server::run_server(service, cfg.host, cfg.port)) {
        exit_with(format!("server failed on {base}: {e}"));
    }
}

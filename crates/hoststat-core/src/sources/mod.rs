//! Metric source implementations.

pub mod helpers;

pub mod gpu;
pub mod host;
pub mod thermal;

pub use host::{DEFAULT_CPU_WINDOW, HostSource, HostSourceConfig, MAX_CPU_WINDOW};

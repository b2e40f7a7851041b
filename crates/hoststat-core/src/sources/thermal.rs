//! Temperature sensor selection.
//!
//! Hosts expose anything from zero to dozens of thermal sensors. The CPU /
//! SoC sensor is chosen by label preference; `sysinfo` components are tried
//! first, then Linux thermal zones.

use std::path::Path;

use super::helpers::{read_first_f64, read_trimmed};

const THERMAL_ROOT: &str = "/sys/class/thermal";

/// Labels checked in order, case-insensitive substring match.
/// `cpu_thermal` is the Raspberry Pi SoC zone.
const PREFERRED_LABELS: &[&str] = &[
    "cpu_thermal",
    "cpu",
    "package",
    "tctl",
    "coretemp",
    "k10temp",
    "soc",
];

/// Plausible operating range, degrees Celsius.
const MIN_CELSIUS: f64 = -40.0;
const MAX_CELSIUS: f64 = 150.0;

fn plausible(celsius: f64) -> bool {
    // Exactly zero is what several drivers report for an absent probe.
    celsius.is_finite() && celsius != 0.0 && (MIN_CELSIUS..=MAX_CELSIUS).contains(&celsius)
}

/// Choose one reading from `(label, celsius)` pairs.
pub(crate) fn pick_temperature<'a, I>(readings: I) -> Option<f64>
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    let candidates: Vec<(String, f64)> = readings
        .into_iter()
        .filter(|(_, c)| plausible(*c))
        .map(|(label, c)| (label.to_ascii_lowercase(), c))
        .collect();

    PREFERRED_LABELS
        .iter()
        .find_map(|want| {
            candidates
                .iter()
                .find(|(label, _)| label.contains(want))
                .map(|(_, c)| *c)
        })
        .or_else(|| candidates.first().map(|(_, c)| *c))
}

/// Read `/sys/class/thermal/thermal_zone*/{type,temp}` (millidegrees).
pub(crate) fn thermal_zone_celsius(root: &Path) -> Option<f64> {
    let entries = std::fs::read_dir(root).ok()?;
    let mut zones: Vec<(String, f64)> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("thermal_zone"))
        })
        .filter_map(|zone| {
            let millis = read_first_f64(&zone.join("temp"))?;
            let kind = read_trimmed(&zone.join("type")).unwrap_or_default();
            Some((kind, millis / 1000.0))
        })
        .collect();
    zones.sort_by(|a, b| a.0.cmp(&b.0));
    pick_temperature(zones.iter().map(|(k, c)| (k.as_str(), *c)))
}

pub(crate) fn sysfs_temperature() -> Option<f64> {
    thermal_zone_celsius(Path::new(THERMAL_ROOT))
}

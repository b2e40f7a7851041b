//! GPU core clock probes.
//!
//! No portable API exposes the GPU clock, so each probe targets one family:
//! the Raspberry Pi firmware (`vcgencmd`), Intel i915 sysfs, and AMD
//! `pp_dpm_sclk`. The first probe that yields a plausible value wins.

use std::path::Path;

use super::helpers::{read_first_f64, read_trimmed, run_command};

const DRM_ROOT: &str = "/sys/class/drm";

/// Parse `frequency(1)=500000000` (Hz) into MHz.
pub(crate) fn parse_vcgencmd_clock(raw: &str) -> Option<u64> {
    let hz: u64 = raw.split_once('=')?.1.trim().parse().ok()?;
    let mhz = hz / 1_000_000;
    (mhz > 0).then_some(mhz)
}

/// Pick the active level (marked `*`) from an AMD `pp_dpm_sclk` table:
///
/// ```text
/// 0: 500Mhz
/// 1: 1340Mhz *
/// ```
pub(crate) fn parse_pp_dpm_sclk(raw: &str) -> Option<u64> {
    raw.lines()
        .find(|line| line.trim_end().ends_with('*'))
        .and_then(|line| line.split_once(':'))
        .and_then(|(_, rest)| {
            rest.trim()
                .trim_end_matches('*')
                .trim()
                .to_ascii_lowercase()
                .strip_suffix("mhz")
                .and_then(|n| n.trim().parse().ok())
        })
        .filter(|&mhz: &u64| mhz > 0)
}

fn vcgencmd_clock() -> Option<u64> {
    run_command("vcgencmd", &["measure_clock", "core"])
        .as_deref()
        .and_then(parse_vcgencmd_clock)
}

fn drm_clock(root: &Path) -> Option<u64> {
    let entries = std::fs::read_dir(root).ok()?;
    let mut cards: Vec<_> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("card") && !n.contains('-'))
        })
        .collect();
    cards.sort();

    for card in cards {
        if let Some(mhz) = read_first_f64(&card.join("gt_cur_freq_mhz")) {
            if mhz > 0.0 {
                return Some(mhz as u64);
            }
        }
        if let Some(mhz) =
            read_trimmed(&card.join("device/pp_dpm_sclk")).and_then(|s| parse_pp_dpm_sclk(&s))
        {
            return Some(mhz);
        }
    }
    None
}

/// Current GPU core clock in MHz, if any probe can see it.
pub fn gpu_clock_mhz() -> Option<u64> {
    vcgencmd_clock().or_else(|| drm_clock(Path::new(DRM_ROOT)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vcgencmd_output_parses() {
        assert_eq!(parse_vcgencmd_clock("frequency(1)=500000992"), Some(500));
        assert_eq!(parse_vcgencmd_clock("frequency(1)=0"), None);
        assert_eq!(parse_vcgencmd_clock("error=1 error_msg=\"bad\""), None);
    }

    #[test]
    fn pp_dpm_sclk_active_level() {
        let table = "0: 500Mhz\n1: 800Mhz\n2: 1340Mhz *\n";
        assert_eq!(parse_pp_dpm_sclk(table), Some(1340));
    }

    #[test]
    fn pp_dpm_sclk_without_active_marker() {
        assert_eq!(parse_pp_dpm_sclk("0: 500Mhz\n1: 800Mhz\n"), None);
    }

    #[test]
    fn drm_probe_reads_intel_sysfs() {
        let dir = tempfile::tempdir().unwrap();
        let card = dir.path().join("card0");
        std::fs::create_dir_all(&card).unwrap();
        std::fs::write(card.join("gt_cur_freq_mhz"), "350\n").unwrap();
        // connector directories are ignored
        std::fs::create_dir_all(dir.path().join("card0-HDMI-A-1")).unwrap();
        assert_eq!(drm_clock(dir.path()), Some(350));
    }

    #[test]
    fn drm_probe_reads_amd_sysfs() {
        let dir = tempfile::tempdir().unwrap();
        let device = dir.path().join("card1/device");
        std::fs::create_dir_all(&device).unwrap();
        std::fs::write(device.join("pp_dpm_sclk"), "0: 300Mhz *\n1: 900Mhz\n").unwrap();
        assert_eq!(drm_clock(dir.path()), Some(300));
    }

    #[test]
    fn drm_probe_missing_root() {
        assert_eq!(drm_clock(Path::new("/nonexistent/hoststat/drm")), None);
    }
}

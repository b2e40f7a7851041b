//! Shared helpers used by the host sensor adapters.
//!
//! Everything platform-specific that is not covered by `sysinfo` (shelling
//! out, sysfs files) goes through these functions so a slow or missing
//! utility degrades into `None` instead of stalling the request.

use std::io::Read;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// Shared command utilities
// ---------------------------------------------------------------------------

/// Upper bound on any single utility invocation.
pub const COMMAND_TIMEOUT: Duration = Duration::from_millis(400);

/// Run a command with [`COMMAND_TIMEOUT`] and return its trimmed stdout.
///
/// Returns `None` if the program is missing, exits non-zero, prints nothing,
/// or runs past the timeout (in which case it is killed).
pub fn run_command(program: &str, args: &[&str]) -> Option<String> {
    run_command_with_timeout(program, args, COMMAND_TIMEOUT)
}

pub fn run_command_with_timeout(program: &str, args: &[&str], timeout: Duration) -> Option<String> {
    let mut child = std::process::Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .ok()?;

    // Drain stdout while waiting so a chatty program cannot fill the pipe
    // and stall until the timeout.
    let mut stdout = child.stdout.take()?;
    let reader = std::thread::spawn(move || {
        let mut out = Vec::new();
        let _ = stdout.read_to_end(&mut out);
        out
    });

    let start = Instant::now();
    // On timeout the reader is left detached; a killed program's descendants
    // may still hold the pipe open.
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break Some(status),
            Ok(None) => {
                if start.elapsed() >= timeout {
                    log::debug!("{program} exceeded {timeout:?}, killing");
                    let _ = child.kill();
                    let _ = child.wait();
                    break None;
                }
                std::thread::sleep(Duration::from_millis(5));
            }
            Err(_) => {
                let _ = child.kill();
                let _ = child.wait();
                break None;
            }
        }
    };

    if !status?.success() {
        return None;
    }
    let out = reader.join().ok()?;
    let s = String::from_utf8_lossy(&out).trim().to_string();
    if s.is_empty() { None } else { Some(s) }
}

// ---------------------------------------------------------------------------
// sysfs / procfs readers
// ---------------------------------------------------------------------------

pub fn read_trimmed(path: &Path) -> Option<String> {
    let raw = std::fs::read_to_string(path).ok()?;
    let v = raw.trim();
    if v.is_empty() {
        None
    } else {
        Some(v.to_string())
    }
}

pub fn read_first_f64(path: &Path) -> Option<f64> {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|s| s.split_whitespace().next().and_then(|v| v.parse().ok()))
}

// ---------------------------------------------------------------------------
// Uptime formatting
// ---------------------------------------------------------------------------

fn plural(n: u64, unit: &str) -> String {
    if n == 1 {
        format!("{n} {unit}")
    } else {
        format!("{n} {unit}s")
    }
}

/// Render seconds since boot the way `uptime -p` does, e.g.
/// `up 2 days, 3 hours, 14 minutes`.
pub fn format_uptime(total_secs: u64) -> String {
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3600;
    let minutes = (total_secs % 3600) / 60;

    let mut parts = Vec::with_capacity(3);
    if days > 0 {
        parts.push(plural(days, "day"));
    }
    if hours > 0 {
        parts.push(plural(hours, "hour"));
    }
    if minutes > 0 || parts.is_empty() {
        parts.push(plural(minutes, "minute"));
    }
    format!("up {}", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uptime_under_a_minute() {
        assert_eq!(format_uptime(42), "up 0 minutes");
    }

    #[test]
    fn uptime_singular_units() {
        assert_eq!(format_uptime(86_400 + 3600 + 60), "up 1 day, 1 hour, 1 minute");
    }

    #[test]
    fn uptime_skips_zero_components() {
        assert_eq!(format_uptime(2 * 86_400 + 5 * 60), "up 2 days, 5 minutes");
        assert_eq!(format_uptime(3 * 3600), "up 3 hours");
    }

    #[test]
    fn missing_program_is_none() {
        assert!(run_command("definitely-not-a-real-binary-hoststat", &[]).is_none());
    }

    #[test]
    #[cfg(unix)]
    fn slow_program_times_out() {
        let started = Instant::now();
        let out = run_command_with_timeout("sleep", &["5"], Duration::from_millis(50));
        assert!(out.is_none());
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    #[cfg(unix)]
    fn output_larger_than_pipe_buffer_is_read() {
        let out = run_command_with_timeout(
            "sh",
            &["-c", "head -c 200000 /dev/zero | tr '\\0' a"],
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(out.len(), 200_000);
        assert!(out.bytes().all(|b| b == b'a'));
    }

    #[test]
    #[cfg(unix)]
    fn echo_output_is_trimmed() {
        assert_eq!(
            run_command("echo", &["  hello  "]).as_deref(),
            Some("hello")
        );
    }

    #[test]
    fn read_first_f64_parses_sysfs_style() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("temp");
        std::fs::write(&path, "48312\n").unwrap();
        assert_eq!(read_first_f64(&path), Some(48312.0));
        assert_eq!(read_first_f64(&dir.path().join("missing")), None);
    }

    #[test]
    fn read_trimmed_empty_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("name");
        std::fs::write(&path, "  \n").unwrap();
        assert_eq!(read_trimmed(&path), None);
    }
}

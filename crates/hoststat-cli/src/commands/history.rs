use std::path::Path;

use hoststat_core::{
    HistoryStore, Reading, SnapshotResponse, SqliteHistory, StoreResult, TimestampFormat,
};

use super::exit_with;

/// Stored samples in the `/stats` array layout. Uptime is never stored, so
/// it is always unavailable here.
pub fn snapshot(
    store: &dyn HistoryStore,
    last: Option<usize>,
    format: TimestampFormat,
) -> StoreResult<SnapshotResponse> {
    let n = last.unwrap_or_else(|| store.capacity());
    let samples = store.read_recent(n)?;
    Ok(SnapshotResponse::from_samples(
        &samples,
        Reading::Unavailable,
        format,
        true,
    ))
}

pub fn run(db: &Path, last: Option<usize>, format: TimestampFormat) {
    if !db.is_file() {
        exit_with(format!("no history database at {}", db.display()));
    }
    // Read-only: a server may still be writing to this file.
    let store = SqliteHistory::open_read_only(db).unwrap_or_else(|e| exit_with(e));
    let json = snapshot(&store, last, format)
        .map_err(|e| e.to_string())
        .and_then(|resp| serde_json::to_string_pretty(&resp).map_err(|e| e.to_string()))
        .unwrap_or_else(|e| exit_with(e));
    println!("{json}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Local, TimeZone};
    use hoststat_core::Sample;

    fn filled(n: u64) -> SqliteHistory {
        let base = Local.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        let mut store = SqliteHistory::open_in_memory(100).unwrap();
        for i in 0..n {
            let mut s = Sample::unavailable(base + Duration::minutes(i as i64));
            s.gpu_speed = Reading::Present(i);
            store.append(s).unwrap();
        }
        store
    }

    #[test]
    fn last_limits_to_newest() {
        let resp = snapshot(&filled(5), Some(2), TimestampFormat::Time).unwrap();
        assert_eq!(resp.timestamps, ["09:03:00", "09:04:00"]);
        assert_eq!(
            resp.gpu_speed,
            Some(vec![Reading::Present(3), Reading::Present(4)])
        );
        assert_eq!(resp.uptime, Reading::Unavailable);
    }

    #[test]
    fn run_leaves_stored_rows_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.db");
        let base = Local.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        {
            let mut store = SqliteHistory::open(&path, 40).unwrap();
            for i in 0..25 {
                store.append(Sample::unavailable(base + Duration::seconds(i))).unwrap();
            }
        }

        run(&path, Some(1), TimestampFormat::Time);

        let store = SqliteHistory::open_read_only(&path).unwrap();
        assert_eq!(store.len().unwrap(), 25);
    }

    #[test]
    fn default_reads_everything() {
        let resp = snapshot(&filled(3), None, TimestampFormat::DateTime).unwrap();
        assert_eq!(resp.len(), 3);
        assert_eq!(resp.timestamps[0], "2024-06-01 09:00:00");
    }
}

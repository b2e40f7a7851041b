use std::path::Path;

use chrono::{DateTime, Local, SecondsFormat};
use rusqlite::{Connection, OpenFlags, Row, params};

use crate::error::{ConfigError, Result, StoreError, StoreResult};
use crate::history::HistoryStore;
use crate::reading::Reading;
use crate::sample::Sample;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS samples (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp   TEXT NOT NULL,
    cpu_usage   REAL,
    ram_usage   REAL,
    disk_usage  REAL,
    temperature REAL,
    cpu_speed   REAL,
    gpu_speed   INTEGER
);
";

const INSERT: &str = "
INSERT INTO samples (timestamp, cpu_usage, ram_usage, disk_usage, temperature, cpu_speed, gpu_speed)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
";

const TRIM: &str = "
DELETE FROM samples
WHERE id NOT IN (SELECT id FROM samples ORDER BY id DESC LIMIT ?1)
";

const SELECT_RECENT: &str = "
SELECT id, timestamp, cpu_usage, ram_usage, disk_usage, temperature, cpu_speed, gpu_speed
FROM (SELECT * FROM samples ORDER BY id DESC LIMIT ?1)
ORDER BY id ASC
";

/// History persisted to a single SQLite table.
///
/// Each append is one transaction holding the insert and the trim, committed
/// with `synchronous=FULL`. A failed append leaves the table as it was.
/// Unavailable readings are stored as NULL.
pub struct SqliteHistory {
    conn: Connection,
    capacity: usize,
}

impl SqliteHistory {
    /// Open (or create) the database at `path`, trimming any rows beyond
    /// `capacity` left by an earlier run with a larger limit.
    pub fn open(path: &Path, capacity: usize) -> Result<Self> {
        let conn = Connection::open(path).map_err(StoreError::from)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(StoreError::from)?;
        let store = Self::init(conn, capacity)?;
        log::info!(
            "opened history at {} ({} samples, capacity {})",
            path.display(),
            store.len()?,
            capacity
        );
        Ok(store)
    }

    /// Open an existing database for inspection only. Nothing is created or
    /// trimmed and appends fail; capacity reports the rows currently held.
    pub fn open_read_only(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(StoreError::from)?;
        let mut store = Self { conn, capacity: 1 };
        store.capacity = store.len()?.max(1);
        Ok(store)
    }

    /// Non-persistent database, same semantics as a file.
    pub fn open_in_memory(capacity: usize) -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(StoreError::from)?;
        Self::init(conn, capacity)
    }

    fn init(conn: Connection, capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity.into());
        }
        conn.execute_batch("PRAGMA synchronous=FULL;")
            .map_err(StoreError::from)?;
        conn.execute_batch(SCHEMA).map_err(StoreError::from)?;
        let removed = conn
            .execute(TRIM, params![sql_count(capacity)])
            .map_err(StoreError::from)?;
        if removed > 0 {
            log::info!("trimmed {removed} samples beyond capacity {capacity}");
        }
        Ok(Self { conn, capacity })
    }
}

fn sql_count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn format_timestamp(ts: &DateTime<Local>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

fn parse_timestamp(id: i64, text: &str) -> StoreResult<DateTime<Local>> {
    DateTime::parse_from_rfc3339(text)
        .map(|ts| ts.with_timezone(&Local))
        .map_err(|e| StoreError::Corrupt {
            id,
            reason: format!("bad timestamp {text:?}: {e}"),
        })
}

// Raw column values; decoding into a Sample happens outside the row
// callback so corrupt rows surface as StoreError::Corrupt.
struct RawRow {
    id: i64,
    timestamp: String,
    cpu_usage: Option<f64>,
    ram_usage: Option<f64>,
    disk_usage: Option<f64>,
    temperature: Option<f64>,
    cpu_speed: Option<f64>,
    gpu_speed: Option<i64>,
}

impl RawRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            timestamp: row.get(1)?,
            cpu_usage: row.get(2)?,
            ram_usage: row.get(3)?,
            disk_usage: row.get(4)?,
            temperature: row.get(5)?,
            cpu_speed: row.get(6)?,
            gpu_speed: row.get(7)?,
        })
    }

    fn into_sample(self) -> StoreResult<Sample> {
        let gpu_speed = match self.gpu_speed {
            None => Reading::Unavailable,
            Some(v) => Reading::Present(u64::try_from(v).map_err(|_| StoreError::Corrupt {
                id: self.id,
                reason: format!("negative gpu_speed {v}"),
            })?),
        };
        Ok(Sample {
            timestamp: parse_timestamp(self.id, &self.timestamp)?,
            cpu_usage: self.cpu_usage.into(),
            ram_usage: self.ram_usage.into(),
            disk_usage: self.disk_usage.into(),
            temperature: self.temperature.into(),
            cpu_speed: self.cpu_speed.into(),
            gpu_speed,
        })
    }
}

impl HistoryStore for SqliteHistory {
    fn append(&mut self, sample: Sample) -> StoreResult<()> {
        let gpu_speed = sample
            .gpu_speed
            .value()
            .map(|&mhz| {
                i64::try_from(mhz).map_err(|_| StoreError::OutOfRange {
                    field: "gpu_speed",
                    value: mhz,
                })
            })
            .transpose()?;
        let tx = self.conn.transaction()?;
        tx.execute(
            INSERT,
            params![
                format_timestamp(&sample.timestamp),
                sample.cpu_usage.value(),
                sample.ram_usage.value(),
                sample.disk_usage.value(),
                sample.temperature.value(),
                sample.cpu_speed.value(),
                gpu_speed,
            ],
        )?;
        tx.execute(TRIM, params![sql_count(self.capacity)])?;
        tx.commit()?;
        Ok(())
    }

    fn read_recent(&self, n: usize) -> StoreResult<Vec<Sample>> {
        let mut stmt = self.conn.prepare_cached(SELECT_RECENT)?;
        let raw = stmt
            .query_map(params![sql_count(n)], RawRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        raw.into_iter().map(RawRow::into_sample).collect()
    }

    fn len(&self) -> StoreResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM samples", [], |r| r.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn base() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 17, 8, 30, 0).unwrap()
    }

    fn sample(i: u64) -> Sample {
        Sample {
            timestamp: base() + Duration::seconds(i as i64),
            cpu_usage: Reading::Present(10.0 + i as f64),
            ram_usage: Reading::Present(50.5),
            disk_usage: Reading::Present(71.2),
            temperature: Reading::Unavailable,
            cpu_speed: Reading::Present(1500.0),
            gpu_speed: Reading::Present(i),
        }
    }

    fn gpu_ids(samples: &[Sample]) -> Vec<u64> {
        samples
            .iter()
            .map(|s| *s.gpu_speed.value().unwrap())
            .collect()
    }

    #[test]
    fn round_trips_with_unavailable_as_null() {
        let mut h = SqliteHistory::open_in_memory(10).unwrap();
        let mut s = sample(1);
        s.timestamp = s.timestamp + Duration::nanoseconds(123_456_789);
        h.append(s.clone()).unwrap();

        let null_temp: Option<f64> = h
            .conn
            .query_row("SELECT temperature FROM samples", [], |r| r.get(0))
            .unwrap();
        assert_eq!(null_temp, None);
        assert_eq!(h.read_recent(1).unwrap(), vec![s]);
    }

    #[test]
    fn trims_oldest_by_insertion_order() {
        let mut h = SqliteHistory::open_in_memory(3).unwrap();
        for i in 1..=5 {
            h.append(sample(i)).unwrap();
        }
        assert_eq!(h.len().unwrap(), 3);
        assert_eq!(gpu_ids(&h.read_recent(10).unwrap()), [3, 4, 5]);
        assert_eq!(gpu_ids(&h.read_recent(2).unwrap()), [4, 5]);
    }

    #[test]
    fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.db");
        {
            let mut h = SqliteHistory::open(&path, 1000).unwrap();
            for i in 0..4 {
                h.append(sample(i)).unwrap();
            }
        }
        let h = SqliteHistory::open(&path, 1000).unwrap();
        assert_eq!(gpu_ids(&h.read_recent(4).unwrap()), [0, 1, 2, 3]);
        assert_eq!(h.read_recent(1).unwrap()[0].timestamp, sample(3).timestamp);
    }

    #[test]
    fn reopen_with_smaller_capacity_trims() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.db");
        {
            let mut h = SqliteHistory::open(&path, 10).unwrap();
            for i in 0..8 {
                h.append(sample(i)).unwrap();
            }
        }
        let h = SqliteHistory::open(&path, 3).unwrap();
        assert_eq!(gpu_ids(&h.read_recent(10).unwrap()), [5, 6, 7]);
    }

    #[test]
    fn failed_insert_leaves_history_unchanged() {
        let mut h = SqliteHistory::open_in_memory(5).unwrap();
        h.append(sample(1)).unwrap();
        h.conn
            .execute_batch(
                "CREATE TRIGGER disk_full BEFORE INSERT ON samples
                 BEGIN SELECT RAISE(ABORT, 'database or disk is full'); END;",
            )
            .unwrap();

        assert!(h.append(sample(2)).is_err());
        assert_eq!(gpu_ids(&h.read_recent(10).unwrap()), [1]);
    }

    #[test]
    fn failed_trim_rolls_back_insert() {
        let mut h = SqliteHistory::open_in_memory(1).unwrap();
        h.append(sample(1)).unwrap();
        h.conn
            .execute_batch(
                "CREATE TRIGGER no_delete BEFORE DELETE ON samples
                 BEGIN SELECT RAISE(ABORT, 'io error'); END;",
            )
            .unwrap();

        assert!(h.append(sample(2)).is_err());
        assert_eq!(h.len().unwrap(), 1);
        assert_eq!(gpu_ids(&h.read_recent(10).unwrap()), [1]);
    }

    #[test]
    fn oversized_gpu_speed_is_rejected() {
        let mut h = SqliteHistory::open_in_memory(5).unwrap();
        h.append(sample(1)).unwrap();
        let mut s = sample(2);
        s.gpu_speed = Reading::Present(u64::MAX);

        let err = h.append(s).unwrap_err();
        assert!(matches!(
            err,
            StoreError::OutOfRange {
                field: "gpu_speed",
                value: u64::MAX
            }
        ));
        assert_eq!(gpu_ids(&h.read_recent(10).unwrap()), [1]);
    }

    #[test]
    fn read_only_open_keeps_every_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.db");
        {
            let mut h = SqliteHistory::open(&path, 50).unwrap();
            for i in 0..12 {
                h.append(sample(i)).unwrap();
            }
        }

        let mut h = SqliteHistory::open_read_only(&path).unwrap();
        assert_eq!(h.capacity(), 12);
        assert_eq!(h.len().unwrap(), 12);
        assert!(h.append(sample(99)).is_err());
        drop(h);

        let h = SqliteHistory::open(&path, 50).unwrap();
        assert_eq!(h.len().unwrap(), 12);
    }

    #[test]
    fn read_only_open_of_missing_table_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE unrelated (x INTEGER);")
            .unwrap();
        assert!(SqliteHistory::open_read_only(&path).is_err());
    }

    #[test]
    fn corrupt_timestamp_is_reported() {
        let h = SqliteHistory::open_in_memory(5).unwrap();
        h.conn
            .execute("INSERT INTO samples (timestamp) VALUES ('yesterday')", [])
            .unwrap();
        let err = h.read_recent(1).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn empty_store_reads_nothing() {
        let h = SqliteHistory::open_in_memory(5).unwrap();
        assert!(h.read_recent(5).unwrap().is_empty());
        assert!(h.is_empty().unwrap());
    }
}

// SQLite repository implementation
use crate::application::snapshot_repository::SnapshotRepository;
use crate::domain::error::DashboardError;
use crate::domain::snapshot::{CountColumn, RawSnapshotRow, RawTimestamp, SnapshotRow};
use crate::infrastructure::config::prepare_query;
use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, Row};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const SNAPSHOT_QUERY: &str = "SELECT ${columns} FROM ${table} ORDER BY timestamp";

#[derive(Debug, Clone)]
pub struct SqliteRepository {
    path: PathBuf,
    table: String,
}

impl SqliteRepository {
    pub fn new(path: impl Into<PathBuf>, table: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            table: table.into(),
        }
    }

    fn snapshot_query(&self) -> String {
        let mut columns = vec!["timestamp".to_string()];
        columns.extend(CountColumn::ALL.iter().map(|c| c.column_name()));

        let mut vars = HashMap::new();
        vars.insert("columns".to_string(), columns.join(", "));
        vars.insert("table".to_string(), self.table.clone());
        prepare_query(SNAPSHOT_QUERY, &vars)
    }

    /// Open, query, close. Runs on the blocking pool.
    fn read_snapshot(path: &Path, query: &str) -> Result<Vec<SnapshotRow>, DashboardError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| {
            DashboardError::unavailable(format!("failed to open {}", path.display()), e)
        })?;

        let mut stmt = conn.prepare(query).map_err(classify_prepare_error)?;
        let raw_rows = stmt
            .query_map([], read_raw_row)
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(|e| DashboardError::unavailable("snapshot query failed", e))?;

        tracing::debug!("Read {} rows from {}", raw_rows.len(), path.display());

        raw_rows
            .into_iter()
            .enumerate()
            .map(|(position, raw)| raw.validate(position))
            .collect()
    }
}

fn read_raw_row(row: &Row<'_>) -> rusqlite::Result<RawSnapshotRow> {
    let timestamp = match row.get_ref(0)? {
        ValueRef::Text(text) => RawTimestamp::Text(String::from_utf8_lossy(text).into_owned()),
        ValueRef::Integer(secs) => RawTimestamp::Text(secs.to_string()),
        ValueRef::Null => RawTimestamp::Missing,
        ValueRef::Real(_) => RawTimestamp::WrongType("REAL"),
        ValueRef::Blob(_) => RawTimestamp::WrongType("BLOB"),
    };

    let mut counts = [None; 8];
    for (i, slot) in counts.iter_mut().enumerate() {
        *slot = match row.get_ref(i + 1)? {
            ValueRef::Integer(value) => Some(value),
            _ => None,
        };
    }

    Ok(RawSnapshotRow { timestamp, counts })
}

/// A missing count column is a malformed snapshot, anything else means the
/// store is not usable right now.
///
/// SQLite has no dedicated code for an unknown column: it is SQLITE_ERROR with
/// the message "no such column: <name>". Anything else under SQLITE_ERROR
/// (missing table, syntax) stays `DataSourceUnavailable`.
fn classify_prepare_error(err: rusqlite::Error) -> DashboardError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, Some(message))
            if failure.code == rusqlite::ErrorCode::Unknown
                && message.starts_with("no such column") =>
        {
            DashboardError::MalformedRow(format!("snapshot table is missing a column: {}", message))
        }
        _ => DashboardError::unavailable("failed to prepare snapshot query", err),
    }
}

#[async_trait]
impl SnapshotRepository for SqliteRepository {
    async fn fetch_latest_snapshot(&self) -> Result<Vec<SnapshotRow>, DashboardError> {
        let path = self.path.clone();
        let query = self.snapshot_query();

        tokio::task::spawn_blocking(move || Self::read_snapshot(&path, &query))
            .await
            .map_err(|e| DashboardError::unavailable("snapshot query task failed", e))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::snapshot::Lane;
    use rusqlite::params;
    use tempfile::TempDir;

    const CREATE_TABLE: &str = "CREATE TABLE lane_vehicle_count (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp DATETIME NOT NULL,
        lane1_fwd INTEGER, lane1_bwd INTEGER,
        lane2_fwd INTEGER, lane2_bwd INTEGER,
        lane3_fwd INTEGER, lane3_bwd INTEGER,
        lane4_fwd INTEGER, lane4_bwd INTEGER
    )";

    fn create_db(dir: &TempDir, rows: &[(&str, [Option<i64>; 8])]) -> PathBuf {
        let path = dir.path().join("counts.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(CREATE_TABLE).unwrap();
        for (ts, c) in rows {
            conn.execute(
                "INSERT INTO lane_vehicle_count
                 (timestamp, lane1_fwd, lane1_bwd, lane2_fwd, lane2_bwd,
                  lane3_fwd, lane3_bwd, lane4_fwd, lane4_bwd)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![ts, c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]],
            )
            .unwrap();
        }
        path
    }

    fn counts(values: [i64; 8]) -> [Option<i64>; 8] {
        values.map(Some)
    }

    #[test]
    fn test_snapshot_query() {
        let repo = SqliteRepository::new("counts.db", "lane_vehicle_count");
        assert_eq!(
            repo.snapshot_query(),
            "SELECT timestamp, lane1_fwd, lane1_bwd, lane2_fwd, lane2_bwd, lane3_fwd, \
             lane3_bwd, lane4_fwd, lane4_bwd FROM lane_vehicle_count ORDER BY timestamp"
        );
    }

    #[tokio::test]
    async fn test_fetch_reads_rows_in_timestamp_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_db(
            &dir,
            &[
                ("2024-03-01 08:00:20", counts([1, 2, 3, 4, 5, 6, 7, 8])),
                ("2024-03-01 08:00:10", counts([0, 0, 0, 0, 0, 0, 0, 0])),
            ],
        );

        let rows = SqliteRepository::new(path, "lane_vehicle_count")
            .fetch_latest_snapshot()
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].formatted_time(), "08:00:10");
        assert_eq!(rows[1].counts, [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(rows[1].lane_total(Lane::Lane4), 15);
    }

    #[tokio::test]
    async fn test_fetch_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_db(&dir, &[]);

        let rows = SqliteRepository::new(path, "lane_vehicle_count")
            .fetch_latest_snapshot()
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_negative_count_rejects_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_db(
            &dir,
            &[
                ("2024-03-01 08:00:10", counts([1; 8])),
                ("2024-03-01 08:00:20", counts([1, 1, 1, 1, 1, -3, 1, 1])),
            ],
        );

        let result = SqliteRepository::new(path, "lane_vehicle_count")
            .fetch_latest_snapshot()
            .await;
        match result {
            Err(DashboardError::MalformedRow(reason)) => assert!(reason.contains("lane3_bwd")),
            other => panic!("expected malformed row, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_null_count_rejects_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let mut row = counts([1; 8]);
        row[2] = None;
        let path = create_db(&dir, &[("2024-03-01 08:00:10", row)]);

        let result = SqliteRepository::new(path, "lane_vehicle_count")
            .fetch_latest_snapshot()
            .await;
        assert!(matches!(result, Err(DashboardError::MalformedRow(_))));
    }

    #[tokio::test]
    async fn test_missing_column_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counts.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE lane_vehicle_count (timestamp TEXT, lane1_fwd INTEGER, lane1_bwd INTEGER)",
        )
        .unwrap();
        drop(conn);

        let result = SqliteRepository::new(path, "lane_vehicle_count")
            .fetch_latest_snapshot()
            .await;
        assert!(matches!(result, Err(DashboardError::MalformedRow(_))));
    }

    #[tokio::test]
    async fn test_real_timestamp_is_reported_as_wrong_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_db(&dir, &[]);
        let conn = Connection::open(&path).unwrap();
        conn.execute(
            "INSERT INTO lane_vehicle_count
             (timestamp, lane1_fwd, lane1_bwd, lane2_fwd, lane2_bwd,
              lane3_fwd, lane3_bwd, lane4_fwd, lane4_bwd)
             VALUES (1709280930.5, 1, 1, 1, 1, 1, 1, 1, 1)",
            [],
        )
        .unwrap();
        drop(conn);

        let result = SqliteRepository::new(path, "lane_vehicle_count")
            .fetch_latest_snapshot()
            .await;
        match result {
            Err(DashboardError::MalformedRow(reason)) => {
                assert!(reason.contains("unsupported type REAL"));
                assert!(!reason.contains("missing"));
            }
            other => panic!("expected malformed row, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_prepare_error() {
        let missing_column = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
            Some("no such column: lane4_bwd".to_string()),
        );
        assert!(matches!(
            classify_prepare_error(missing_column),
            DashboardError::MalformedRow(_)
        ));

        let missing_table = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
            Some("no such table: lane_vehicle_count".to_string()),
        );
        assert!(matches!(
            classify_prepare_error(missing_table),
            DashboardError::DataSourceUnavailable { .. }
        ));

        let busy = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            Some("no such column: lane4_bwd".to_string()),
        );
        assert!(matches!(
            classify_prepare_error(busy),
            DashboardError::DataSourceUnavailable { .. }
        ));
    }

    #[tokio::test]
    async fn test_missing_database_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let result = SqliteRepository::new(dir.path().join("absent.db"), "lane_vehicle_count")
            .fetch_latest_snapshot()
            .await;
        assert!(matches!(
            result,
            Err(DashboardError::DataSourceUnavailable { .. })
        ));
        assert!(!dir.path().join("absent.db").exists());
    }

    #[tokio::test]
    async fn test_missing_table_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_db(&dir, &[]);
        let result = SqliteRepository::new(path, "other_table")
            .fetch_latest_snapshot()
            .await;
        assert!(matches!(
            result,
            Err(DashboardError::DataSourceUnavailable { .. })
        ));
    }
}

// Snapshot domain model - one row per sensor sampling interval
use super::error::DashboardError;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;

/// Timestamp layout used for export and display of full instants.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Lane {
    #[serde(rename = "Lane 1")]
    Lane1,
    #[serde(rename = "Lane 2")]
    Lane2,
    #[serde(rename = "Lane 3")]
    Lane3,
    #[serde(rename = "Lane 4")]
    Lane4,
}

impl Lane {
    /// Canonical lane order. Ties in ranking fall back to this order.
    pub const ALL: [Lane; 4] = [Lane::Lane1, Lane::Lane2, Lane::Lane3, Lane::Lane4];

    pub fn index(self) -> usize {
        match self {
            Lane::Lane1 => 0,
            Lane::Lane2 => 1,
            Lane::Lane3 => 2,
            Lane::Lane4 => 3,
        }
    }

    pub fn number(self) -> usize {
        self.index() + 1
    }

    pub fn name(self) -> &'static str {
        match self {
            Lane::Lane1 => "Lane 1",
            Lane::Lane2 => "Lane 2",
            Lane::Lane3 => "Lane 3",
            Lane::Lane4 => "Lane 4",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub fn name(self) -> &'static str {
        match self {
            Direction::Forward => "Forward",
            Direction::Backward => "Backward",
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Direction::Forward => "fwd",
            Direction::Backward => "bwd",
        }
    }
}

/// One of the eight lane/direction count columns of the snapshot table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CountColumn {
    pub lane: Lane,
    pub direction: Direction,
}

impl CountColumn {
    /// Column order of the table: lane1_fwd, lane1_bwd, lane2_fwd, ...
    pub const ALL: [CountColumn; 8] = [
        CountColumn::new(Lane::Lane1, Direction::Forward),
        CountColumn::new(Lane::Lane1, Direction::Backward),
        CountColumn::new(Lane::Lane2, Direction::Forward),
        CountColumn::new(Lane::Lane2, Direction::Backward),
        CountColumn::new(Lane::Lane3, Direction::Forward),
        CountColumn::new(Lane::Lane3, Direction::Backward),
        CountColumn::new(Lane::Lane4, Direction::Forward),
        CountColumn::new(Lane::Lane4, Direction::Backward),
    ];

    pub const fn new(lane: Lane, direction: Direction) -> Self {
        Self { lane, direction }
    }

    pub fn index(self) -> usize {
        let offset = match self.direction {
            Direction::Forward => 0,
            Direction::Backward => 1,
        };
        self.lane.index() * 2 + offset
    }

    /// Table column name, e.g. `lane3_bwd`.
    pub fn column_name(self) -> String {
        format!("lane{}_{}", self.lane.number(), self.direction.suffix())
    }

    /// Display label, e.g. `Lane 3 Backward`.
    pub fn label(self) -> String {
        format!("{} {}", self.lane.name(), self.direction.name())
    }
}

/// A validated observation. Counts are indexed by `CountColumn::index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRow {
    pub timestamp: NaiveDateTime,
    pub counts: [u32; 8],
}

impl SnapshotRow {
    pub fn new(timestamp: NaiveDateTime, counts: [u32; 8]) -> Self {
        Self { timestamp, counts }
    }

    pub fn count(&self, column: CountColumn) -> u32 {
        self.counts[column.index()]
    }

    pub fn lane_total(&self, lane: Lane) -> u64 {
        u64::from(self.count(CountColumn::new(lane, Direction::Forward)))
            + u64::from(self.count(CountColumn::new(lane, Direction::Backward)))
    }

    /// Time of day shown on the chart axes.
    pub fn formatted_time(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

/// Timestamp cell as read from the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RawTimestamp {
    #[default]
    Missing,
    Text(String),
    /// Stored with a type that carries no timestamp, e.g. REAL or BLOB.
    WrongType(&'static str),
}

/// A row as read from the store, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSnapshotRow {
    pub timestamp: RawTimestamp,
    pub counts: [Option<i64>; 8],
}

impl RawSnapshotRow {
    /// Validate at the boundary. Missing or negative counts are rejected, never coerced.
    pub fn validate(self, position: usize) -> Result<SnapshotRow, DashboardError> {
        let raw_timestamp = match self.timestamp {
            RawTimestamp::Text(text) => text,
            RawTimestamp::Missing => {
                return Err(DashboardError::MalformedRow(format!(
                    "row {}: timestamp is missing",
                    position
                )));
            }
            RawTimestamp::WrongType(kind) => {
                return Err(DashboardError::MalformedRow(format!(
                    "row {}: timestamp has unsupported type {}",
                    position, kind
                )));
            }
        };
        let timestamp = parse_timestamp(&raw_timestamp).ok_or_else(|| {
            DashboardError::MalformedRow(format!(
                "row {}: cannot parse timestamp '{}'",
                position, raw_timestamp
            ))
        })?;

        let mut counts = [0u32; 8];
        for column in CountColumn::ALL {
            let value = self.counts[column.index()].ok_or_else(|| {
                DashboardError::MalformedRow(format!(
                    "row {}: {} is missing or not an integer",
                    position,
                    column.column_name()
                ))
            })?;
            counts[column.index()] = u32::try_from(value).map_err(|_| {
                DashboardError::MalformedRow(format!(
                    "row {}: {} is out of range ({})",
                    position,
                    column.column_name(),
                    value
                ))
            })?;
        }

        Ok(SnapshotRow::new(timestamp, counts))
    }
}

/// Parse the timestamp layouts a SQL store commonly hands back.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    for format in [TIMESTAMP_FORMAT, "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(value, format) {
            return Some(ts);
        }
    }

    // Keep the wall-clock time of the source row, not the shifted UTC instant
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.naive_local());
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }

    // Unix seconds
    value
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|ts| ts.naive_utc())
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Stable sort by timestamp; rows sharing an instant keep delivery order.
pub fn order_chronologically(rows: &mut [SnapshotRow]) {
    rows.sort_by_key(|row| row.timestamp);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(timestamp: &str, counts: [i64; 8]) -> RawSnapshotRow {
        RawSnapshotRow {
            timestamp: RawTimestamp::Text(timestamp.to_string()),
            counts: counts.map(Some),
        }
    }

    #[test]
    fn test_column_names_follow_table_layout() {
        let names: Vec<String> = CountColumn::ALL.iter().map(|c| c.column_name()).collect();
        assert_eq!(
            names,
            vec![
                "lane1_fwd", "lane1_bwd", "lane2_fwd", "lane2_bwd", "lane3_fwd", "lane3_bwd",
                "lane4_fwd", "lane4_bwd"
            ]
        );
        assert_eq!(CountColumn::ALL[5].label(), "Lane 3 Backward");
        for (i, column) in CountColumn::ALL.iter().enumerate() {
            assert_eq!(column.index(), i);
        }
    }

    #[test]
    fn test_validate_accepts_well_formed_row() {
        let row = raw("2024-03-01 08:15:30", [1, 2, 3, 4, 5, 6, 7, 8])
            .validate(0)
            .unwrap();
        assert_eq!(row.counts, [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(row.formatted_time(), "08:15:30");
        assert_eq!(row.lane_total(Lane::Lane3), 11);
    }

    #[test]
    fn test_validate_rejects_negative_count() {
        let err = raw("2024-03-01 08:15:30", [1, 2, 3, -4, 5, 6, 7, 8])
            .validate(3)
            .unwrap_err();
        match err {
            DashboardError::MalformedRow(reason) => {
                assert!(reason.contains("row 3"));
                assert!(reason.contains("lane2_bwd"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_rejects_missing_count() {
        let mut row = raw("2024-03-01 08:15:30", [1; 8]);
        row.counts[6] = None;
        assert!(matches!(row.validate(0), Err(DashboardError::MalformedRow(_))));
    }

    #[test]
    fn test_validate_rejects_bad_timestamp() {
        assert!(matches!(
            raw("yesterday", [0; 8]).validate(0),
            Err(DashboardError::MalformedRow(_))
        ));
        let missing = RawSnapshotRow {
            timestamp: RawTimestamp::Missing,
            counts: [Some(0); 8],
        };
        match missing.validate(0) {
            Err(DashboardError::MalformedRow(reason)) => assert!(reason.contains("missing")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_validate_reports_wrong_timestamp_type() {
        let real = RawSnapshotRow {
            timestamp: RawTimestamp::WrongType("REAL"),
            counts: [Some(0); 8],
        };
        match real.validate(4) {
            Err(DashboardError::MalformedRow(reason)) => {
                assert!(reason.contains("row 4"));
                assert!(reason.contains("unsupported type REAL"));
                assert!(!reason.contains("missing"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_offset_timestamp_keeps_wall_clock() {
        let row = raw("2024-03-01T08:15:30+05:30", [1; 8]).validate(0).unwrap();
        assert_eq!(row.formatted_time(), "08:15:30");
        assert_eq!(format_timestamp(&row.timestamp), "2024-03-01 08:15:30");
    }

    #[test]
    fn test_parse_timestamp_layouts() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(8, 15, 30)
            .unwrap();
        assert_eq!(parse_timestamp("2024-03-01 08:15:30"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T08:15:30"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T08:15:30Z"), Some(expected));
        assert_eq!(parse_timestamp(&expected.and_utc().timestamp().to_string()), Some(expected));

        let fractional = parse_timestamp("2024-03-01 08:15:30.250").unwrap();
        assert_eq!(format_timestamp(&fractional), "2024-03-01 08:15:30.250");
        assert_eq!(format_timestamp(&expected), "2024-03-01 08:15:30");
    }

    #[test]
    fn test_order_chronologically_is_stable() {
        let early = parse_timestamp("2024-03-01 08:00:00").unwrap();
        let late = parse_timestamp("2024-03-01 09:00:00").unwrap();
        let mut rows = vec![
            SnapshotRow::new(late, [1; 8]),
            SnapshotRow::new(early, [2; 8]),
            SnapshotRow::new(late, [3; 8]),
        ];
        order_chronologically(&mut rows);
        let firsts: Vec<u32> = rows.iter().map(|r| r.counts[0]).collect();
        assert_eq!(firsts, vec![2, 1, 3]);
    }
}

// CSV report of the raw snapshot
use crate::domain::snapshot::{format_timestamp, CountColumn, SnapshotRow};
use bytes::{BufMut, Bytes, BytesMut};

pub const REPORT_FILE_NAME: &str = "vehicle_count_report.csv";
pub const REPORT_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

pub fn header_line() -> String {
    let mut columns = vec!["timestamp".to_string()];
    columns.extend(CountColumn::ALL.iter().map(|c| c.column_name()));
    columns.join(",")
}

/// Header plus one line per row, comma-delimited, `\n` terminated.
pub fn write_report(rows: &[SnapshotRow]) -> Bytes {
    let mut out = BytesMut::with_capacity(80 * (rows.len() + 1));
    out.put_slice(header_line().as_bytes());
    out.put_u8(b'\n');

    for row in rows {
        out.put_slice(format_timestamp(&row.timestamp).as_bytes());
        for count in row.counts {
            out.put_u8(b',');
            out.put_slice(count.to_string().as_bytes());
        }
        out.put_u8(b'\n');
    }

    out.freeze()
}

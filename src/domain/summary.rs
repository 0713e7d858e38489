// Aggregation of a snapshot into direction summaries and latest lane totals
use super::error::DashboardError;
use super::snapshot::{CountColumn, Lane, SnapshotRow};
use chrono::NaiveDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectionSummary {
    pub column: CountColumn,
    pub total: u64,
}

/// Forward + backward count per lane for the most recent interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LaneTotals([u64; 4]);

impl LaneTotals {
    pub fn new(totals: [u64; 4]) -> Self {
        Self(totals)
    }

    pub fn get(&self, lane: Lane) -> u64 {
        self.0[lane.index()]
    }

    /// Totals in canonical lane order.
    pub fn iter(&self) -> impl Iterator<Item = (Lane, u64)> + '_ {
        Lane::ALL.into_iter().map(move |lane| (lane, self.get(lane)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotSummary {
    pub direction_summaries: [DirectionSummary; 8],
    pub lane_totals: LaneTotals,
    pub latest: NaiveDateTime,
}

/// Reduce a snapshot to its aggregates.
///
/// Direction summaries cover every row. Lane totals come from the row with the
/// greatest timestamp; when several rows share it, the one delivered last wins.
pub fn summarize(rows: &[SnapshotRow]) -> Result<SnapshotSummary, DashboardError> {
    let latest = rows
        .iter()
        .max_by_key(|row| row.timestamp)
        .ok_or(DashboardError::EmptyDataset)?;

    let direction_summaries = CountColumn::ALL.map(|column| DirectionSummary {
        column,
        total: rows.iter().map(|row| u64::from(row.count(column))).sum(),
    });

    let lane_totals = LaneTotals::new(Lane::ALL.map(|lane| latest.lane_total(lane)));

    Ok(SnapshotSummary {
        direction_summaries,
        lane_totals,
        latest: latest.timestamp,
    })
}

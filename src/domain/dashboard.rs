// Dashboard domain model - everything one rendering cycle hands to the presentation layer
use super::signal::{LaneSignal, MaxLane, Recommendation};
use super::snapshot::{format_timestamp, CountColumn, SnapshotRow};
use super::summary::SnapshotSummary;
use serde::Serialize;

pub const DASHBOARD_TITLE: &str = "🚦 Multi-Lane Vehicle Count Dashboard";

/// Line colors for the eight per-direction series, in column order.
pub const SERIES_COLORS: [&str; 8] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
];

#[derive(Debug, Clone, Serialize)]
pub struct DirectionTotal {
    pub id: String,
    pub label: String,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeriesPoint {
    pub time: String,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct LaneSeries {
    pub id: String,
    pub name: String,
    pub color: &'static str,
    pub points: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignalView {
    #[serde(flatten)]
    pub signal: LaneSignal,
    pub label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub title: String,
    pub row_count: usize,
    pub latest: String,
    pub totals: Vec<DirectionTotal>,
    pub series: Vec<LaneSeries>,
    pub signals: Vec<SignalView>,
    pub max_lane: MaxLane,
    /// Chronologically ordered rows for the raw data view.
    #[serde(skip)]
    pub rows: Vec<SnapshotRow>,
}

impl Dashboard {
    /// Assemble the view model. `rows` must already be in chronological order.
    pub fn new(
        rows: Vec<SnapshotRow>,
        summary: &SnapshotSummary,
        recommendation: &Recommendation,
    ) -> Self {
        let totals = summary
            .direction_summaries
            .iter()
            .map(|s| DirectionTotal {
                id: s.column.column_name(),
                label: s.column.label(),
                total: s.total,
            })
            .collect();

        let series = CountColumn::ALL
            .iter()
            .map(|column| LaneSeries {
                id: column.column_name(),
                name: column.label(),
                color: SERIES_COLORS[column.index()],
                points: rows
                    .iter()
                    .map(|row| SeriesPoint {
                        time: row.formatted_time(),
                        count: row.count(*column),
                    })
                    .collect(),
            })
            .collect();

        let signals = recommendation
            .final_status
            .iter()
            .map(|signal| SignalView {
                signal: *signal,
                label: signal.status.label(),
            })
            .collect();

        Self {
            title: DASHBOARD_TITLE.to_string(),
            row_count: rows.len(),
            latest: format_timestamp(&summary.latest),
            totals,
            series,
            signals,
            max_lane: recommendation.max_lane,
            rows,
        }
    }

    pub fn max_lane_message(&self) -> String {
        format!(
            "Highest vehicle count in last interval: {} with {} vehicles.",
            self.max_lane.lane.name(),
            self.max_lane.count
        )
    }
}

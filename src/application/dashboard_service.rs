// Dashboard service - Use case for one rendering cycle and the CSV report
use crate::application::snapshot_repository::SnapshotRepository;
use crate::domain::dashboard::Dashboard;
use crate::domain::error::DashboardError;
use crate::domain::signal::{recommend, OverrideEvents};
use crate::domain::snapshot::order_chronologically;
use crate::domain::summary::summarize;
use crate::infrastructure::csv_report::write_report;
use bytes::Bytes;
use std::sync::Arc;

#[derive(Clone)]
pub struct DashboardService {
    repository: Arc<dyn SnapshotRepository>,
}

impl DashboardService {
    pub fn new(repository: Arc<dyn SnapshotRepository>) -> Self {
        Self { repository }
    }

    /// Fetch, aggregate and recommend. Nothing survives into the next cycle.
    pub async fn render_cycle(&self, overrides: &OverrideEvents) -> Result<Dashboard, DashboardError> {
        let mut rows = self.repository.fetch_latest_snapshot().await?;
        order_chronologically(&mut rows);

        let summary = summarize(&rows)?;
        let recommendation = recommend(&summary.lane_totals, overrides);

        tracing::debug!(
            rows = rows.len(),
            latest = %summary.latest,
            max_lane = recommendation.max_lane.lane.name(),
            overrides = !overrides.is_empty(),
            "rendering cycle complete"
        );

        Ok(Dashboard::new(rows, &summary, &recommendation))
    }

    /// CSV report of the current snapshot in delivery order. An empty table
    /// still yields the header row.
    pub async fn export_report(&self) -> Result<Bytes, DashboardError> {
        let rows = self.repository.fetch_latest_snapshot().await?;
        tracing::debug!(rows = rows.len(), "exporting vehicle count report");
        Ok(write_report(&rows))
    }
}

// Repository trait for snapshot access
use crate::domain::error::DashboardError;
use crate::domain::snapshot::SnapshotRow;
use async_trait::async_trait;

#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// Fetch every row of the vehicle count table, validated.
    ///
    /// One blocking query per call, no retry. Rows come back in the order the
    /// store delivers them.
    async fn fetch_latest_snapshot(&self) -> Result<Vec<SnapshotRow>, DashboardError>;
}

// Errors that abort a single rendering cycle
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum DashboardError {
    /// The snapshot store could not be reached or the query failed.
    #[error("data source unavailable: {context}: {source}")]
    DataSourceUnavailable {
        context: String,
        #[source]
        source: BoxError,
    },

    /// The snapshot holds zero rows, so there is no latest interval.
    #[error("snapshot contains no rows")]
    EmptyDataset,

    /// A row is missing a column, holds a negative count or an unreadable timestamp.
    #[error("malformed row: {0}")]
    MalformedRow(String),
}

impl DashboardError {
    pub fn unavailable(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::DataSourceUnavailable {
            context: context.into(),
            source: source.into(),
        }
    }
}

// Domain layer - Snapshot rows, aggregation and signal recommendation
pub mod dashboard;
pub mod error;
pub mod signal;
pub mod snapshot;
pub mod summary;

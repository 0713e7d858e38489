// Application layer - Use cases over the snapshot store
pub mod dashboard_service;
pub mod snapshot_repository;

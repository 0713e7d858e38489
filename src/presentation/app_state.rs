// Application state for HTTP handlers
use crate::application::dashboard_service::DashboardService;
use crate::domain::dashboard::Dashboard;
use crate::infrastructure::config::RefreshSettings;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct AppState {
    pub dashboard_service: DashboardService,
    pub refresh: RefreshSettings,
    /// Last successfully rendered page, shown as stale when a cycle fails.
    pub last_rendered: Arc<RwLock<Option<Dashboard>>>,
}

impl AppState {
    pub fn new(dashboard_service: DashboardService, refresh: RefreshSettings) -> Self {
        Self {
            dashboard_service,
            refresh,
            last_rendered: Arc::new(RwLock::new(None)),
        }
    }
}

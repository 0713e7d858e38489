// HTTP request handlers
use crate::domain::dashboard::Dashboard;
use crate::domain::error::DashboardError;
use crate::domain::signal::{LaneOverride, OverrideEvents, SignalStatus};
use crate::domain::snapshot::Lane;
use crate::infrastructure::csv_report::{REPORT_CONTENT_TYPE, REPORT_FILE_NAME};
use crate::infrastructure::http_response::{accepts_brotli, download_response, json_response};
use crate::presentation::app_state::AppState;
use crate::presentation::page::{render_page, PageSettings};
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

/// Override controls pressed in this cycle plus the auto-refresh toggle.
#[derive(Debug, Default, Deserialize)]
pub struct CycleQuery {
    #[serde(default)]
    pub lane1_red: bool,
    #[serde(default)]
    pub lane1_yellow: bool,
    #[serde(default)]
    pub lane1_green: bool,
    #[serde(default)]
    pub lane2_red: bool,
    #[serde(default)]
    pub lane2_yellow: bool,
    #[serde(default)]
    pub lane2_green: bool,
    #[serde(default)]
    pub lane3_red: bool,
    #[serde(default)]
    pub lane3_yellow: bool,
    #[serde(default)]
    pub lane3_green: bool,
    #[serde(default)]
    pub lane4_red: bool,
    #[serde(default)]
    pub lane4_yellow: bool,
    #[serde(default)]
    pub lane4_green: bool,
    pub refresh: Option<bool>,
}

impl CycleQuery {
    fn lane_override(&self, lane: Lane) -> LaneOverride {
        let (red, yellow, green) = match lane {
            Lane::Lane1 => (self.lane1_red, self.lane1_yellow, self.lane1_green),
            Lane::Lane2 => (self.lane2_red, self.lane2_yellow, self.lane2_green),
            Lane::Lane3 => (self.lane3_red, self.lane3_yellow, self.lane3_green),
            Lane::Lane4 => (self.lane4_red, self.lane4_yellow, self.lane4_green),
        };
        LaneOverride { red, yellow, green }
    }

    pub fn override_events(&self) -> OverrideEvents {
        let mut events = OverrideEvents::none();
        for lane in Lane::ALL {
            let controls = self.lane_override(lane);
            if controls.red {
                events.press(lane, SignalStatus::Red);
            }
            if controls.yellow {
                events.press(lane, SignalStatus::Yellow);
            }
            if controls.green {
                events.press(lane, SignalStatus::Green);
            }
        }
        events
    }
}

pub fn status_for(err: &DashboardError) -> StatusCode {
    match err {
        DashboardError::DataSourceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        DashboardError::EmptyDataset => StatusCode::NOT_FOUND,
        DashboardError::MalformedRow(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

/// JSON error body for API routes
pub struct ApiError(pub DashboardError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.0.to_string() });
        (status_for(&self.0), axum::Json(body)).into_response()
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

async fn run_cycle(state: &AppState, query: &CycleQuery) -> Result<Dashboard, DashboardError> {
    let overrides = query.override_events();
    match state.dashboard_service.render_cycle(&overrides).await {
        Ok(dashboard) => {
            *state.last_rendered.write().await = Some(dashboard.clone());
            Ok(dashboard)
        }
        Err(e) => {
            tracing::warn!("Rendering cycle failed: {}", e);
            Err(e)
        }
    }
}

/// Dashboard page, one rendering cycle per request
pub async fn dashboard_page(
    Query(query): Query<CycleQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let settings = PageSettings {
        auto_refresh: query.refresh.unwrap_or(state.refresh.enabled),
        interval_ms: state.refresh.interval_ms,
    };

    match run_cycle(&state, &query).await {
        Ok(dashboard) => Html(render_page(Some(&dashboard), None, &settings)).into_response(),
        Err(e) => {
            let stale = state.last_rendered.read().await.clone();
            let page = render_page(stale.as_ref(), Some(&e.to_string()), &settings);
            (status_for(&e), Html(page)).into_response()
        }
    }
}

/// Dashboard view model as JSON
pub async fn dashboard_json(
    Query(query): Query<CycleQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let compress = accepts_brotli(&headers);

    match run_cycle(&state, &query).await {
        Ok(dashboard) => json_response(StatusCode::OK, &dashboard, compress).await,
        Err(e) => ApiError(e).into_response(),
    }
}

/// CSV download of the current snapshot
pub async fn download_report(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let compress = accepts_brotli(&headers);

    match state.dashboard_service.export_report().await {
        Ok(csv) => download_response(REPORT_CONTENT_TYPE, REPORT_FILE_NAME, csv.to_vec(), compress).await,
        Err(e) => {
            tracing::error!("Error exporting report: {}", e);
            ApiError(e).into_response()
        }
    }
}

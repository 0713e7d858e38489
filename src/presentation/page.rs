// Server-side rendering of the dashboard page
use crate::domain::dashboard::{Dashboard, LaneSeries};
use crate::domain::signal::SignalStatus;
use crate::domain::snapshot::{format_timestamp, CountColumn, Lane};
use crate::infrastructure::csv_report::REPORT_FILE_NAME;
use std::fmt::Write;

const CHART_WIDTH: f64 = 320.0;
const CHART_HEIGHT: f64 = 160.0;
const CHART_PAD: f64 = 24.0;

#[derive(Debug, Clone, Copy)]
pub struct PageSettings {
    pub auto_refresh: bool,
    pub interval_ms: u64,
}

const STYLE: &str = r#"
body { background-color: #FFF0F5; font-family: sans-serif; margin: 0; }
.block-container { padding: 2rem; }
.section { background-color: white; padding: 20px; border-radius: 12px;
           box-shadow: 0 4px 6px rgba(0, 0, 0, 0.1); margin-bottom: 20px; }
.error { background-color: #fde2e2; color: #8a1c1c; }
.grid { display: grid; grid-template-columns: repeat(4, 1fr); gap: 16px; }
.bar-row { display: flex; align-items: center; margin: 4px 0; }
.bar-label { width: 160px; }
.bar { background-color: #1f77b4; height: 18px; margin-right: 8px; }
.metric { font-size: 1.6rem; }
.info { background-color: #e8f1fb; padding: 12px; border-radius: 8px; }
table { border-collapse: collapse; }
td, th { border: 1px solid #ddd; padding: 4px 8px; text-align: right; }
"#;

/// Render the page. With an error, `dashboard` is the last good cycle, if any.
pub fn render_page(dashboard: Option<&Dashboard>, error: Option<&str>, settings: &PageSettings) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">");
    html.push_str("<title>Multi-Lane Vehicle Monitoring</title>");
    if settings.auto_refresh {
        // Reload without override parameters so a press only lasts one cycle
        let seconds = settings.interval_ms.div_ceil(1000).max(1);
        let _ = write!(
            html,
            "<meta http-equiv=\"refresh\" content=\"{};url=/?refresh=true\">",
            seconds
        );
    }
    let _ = write!(html, "<style>{}</style></head><body><div class=\"block-container\">", STYLE);

    let _ = write!(
        html,
        "<div class=\"section\"><h1>{}</h1>",
        crate::domain::dashboard::DASHBOARD_TITLE
    );
    render_refresh_toggle(&mut html, settings);
    html.push_str("</div>");

    if let Some(message) = error {
        let _ = write!(
            html,
            "<div class=\"section error\"><strong>Refresh failed:</strong> {}",
            html_escape::encode_text(message)
        );
        if let Some(stale) = dashboard {
            let _ = write!(
                html,
                "<br>Showing stale data from the last successful refresh (latest row {}).",
                html_escape::encode_text(&stale.latest)
            );
        }
        html.push_str("</div>");
    }

    if let Some(dashboard) = dashboard {
        render_raw_data(&mut html, dashboard);
        render_summary(&mut html, dashboard);
        render_series(&mut html, dashboard);
        render_signals(&mut html, dashboard, settings);
        render_max_lane(&mut html, dashboard);
        render_download(&mut html);
    }

    html.push_str("</div></body></html>\n");
    html
}

fn render_refresh_toggle(html: &mut String, settings: &PageSettings) {
    let seconds = settings.interval_ms as f64 / 1000.0;
    if settings.auto_refresh {
        let _ = write!(
            html,
            "<p>🔄 Auto refresh every {} seconds is on. <a href=\"/?refresh=false\">Turn off</a></p>",
            seconds
        );
    } else {
        let _ = write!(
            html,
            "<p>🔄 Auto refresh is off. <a href=\"/?refresh=true\">Refresh every {} seconds</a> \
             or <a href=\"/?refresh=false\">refresh now</a></p>",
            seconds
        );
    }
}

fn render_raw_data(html: &mut String, dashboard: &Dashboard) {
    html.push_str("<div class=\"section\"><details><summary>📄 View Raw Data</summary><table><tr><th>timestamp</th>");
    for column in CountColumn::ALL {
        let _ = write!(html, "<th>{}</th>", column.column_name());
    }
    html.push_str("</tr>");
    for row in &dashboard.rows {
        let _ = write!(html, "<tr><td>{}</td>", format_timestamp(&row.timestamp));
        for count in row.counts {
            let _ = write!(html, "<td>{}</td>", count);
        }
        html.push_str("</tr>");
    }
    html.push_str("</table></details></div>");
}

fn render_summary(html: &mut String, dashboard: &Dashboard) {
    html.push_str("<div class=\"section\"><h2>🔢 Total Vehicle Count Summary</h2>");
    let max = dashboard.totals.iter().map(|t| t.total).max().unwrap_or(0).max(1);
    for total in &dashboard.totals {
        let width = total.total as f64 / max as f64 * 60.0;
        let _ = write!(
            html,
            "<div class=\"bar-row\"><span class=\"bar-label\">{}</span>\
             <span class=\"bar\" style=\"width: {:.1}%\"></span>{}</div>",
            total.label, width, total.total
        );
    }
    html.push_str("</div>");
}

fn render_series(html: &mut String, dashboard: &Dashboard) {
    html.push_str("<div class=\"section\"><h2>📈 Traffic Flow Over Time</h2><div class=\"grid\">");
    for series in &dashboard.series {
        let _ = write!(html, "<div><h3>{}</h3>{}</div>", series.name, line_chart_svg(series));
    }
    html.push_str("</div></div>");
}

/// Line chart with markers, x = formatted time, y = vehicle count.
fn line_chart_svg(series: &LaneSeries) -> String {
    let mut svg = String::new();
    let _ = write!(
        svg,
        "<svg width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" role=\"img\">",
        w = CHART_WIDTH,
        h = CHART_HEIGHT
    );

    let max = series.points.iter().map(|p| p.count).max().unwrap_or(0).max(1) as f64;
    let span = (series.points.len().saturating_sub(1)).max(1) as f64;
    let inner_w = CHART_WIDTH - 2.0 * CHART_PAD;
    let inner_h = CHART_HEIGHT - 2.0 * CHART_PAD;

    let coords: Vec<(f64, f64)> = series
        .points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let x = CHART_PAD + i as f64 / span * inner_w;
            let y = CHART_HEIGHT - CHART_PAD - p.count as f64 / max * inner_h;
            (x, y)
        })
        .collect();

    let _ = write!(
        svg,
        "<line x1=\"{p}\" y1=\"{b}\" x2=\"{r}\" y2=\"{b}\" stroke=\"#999\"/>\
         <line x1=\"{p}\" y1=\"{p}\" x2=\"{p}\" y2=\"{b}\" stroke=\"#999\"/>",
        p = CHART_PAD,
        b = CHART_HEIGHT - CHART_PAD,
        r = CHART_WIDTH - CHART_PAD
    );

    let polyline: Vec<String> = coords.iter().map(|(x, y)| format!("{:.1},{:.1}", x, y)).collect();
    let _ = write!(
        svg,
        "<polyline fill=\"none\" stroke=\"{}\" stroke-width=\"2\" points=\"{}\"/>",
        series.color,
        polyline.join(" ")
    );
    for ((x, y), point) in coords.iter().zip(&series.points) {
        let _ = write!(
            svg,
            "<circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"3\" fill=\"{}\"><title>{}: {}</title></circle>",
            x, y, series.color, point.time, point.count
        );
    }

    if let (Some(first), Some(last)) = (series.points.first(), series.points.last()) {
        let _ = write!(
            svg,
            "<text x=\"{p}\" y=\"{h}\" font-size=\"10\">{}</text>\
             <text x=\"{r}\" y=\"{h}\" font-size=\"10\" text-anchor=\"end\">{}</text>",
            first.time,
            last.time,
            p = CHART_PAD,
            r = CHART_WIDTH - CHART_PAD,
            h = CHART_HEIGHT - 6.0
        );
    }
    let _ = write!(
        svg,
        "<text x=\"2\" y=\"{}\" font-size=\"10\">{}</text></svg>",
        CHART_PAD - 6.0,
        max
    );
    svg
}

fn render_signals(html: &mut String, dashboard: &Dashboard, settings: &PageSettings) {
    html.push_str("<div class=\"section\"><h2>🚥 Suggested Traffic Light Status</h2><div class=\"grid\">");
    for view in &dashboard.signals {
        let _ = write!(
            html,
            "<div>{}: {}</div>",
            view.signal.lane.name(),
            view.signal.recommended.label()
        );
    }
    html.push_str("</div></div>");

    html.push_str("<div class=\"section\"><h2>🎛️ Manual Override</h2><div class=\"grid\">");
    for lane in Lane::ALL {
        let _ = write!(
            html,
            "<form method=\"get\" action=\"/\"><strong>{}</strong><br>\
             <input type=\"hidden\" name=\"refresh\" value=\"{}\">",
            lane.name(),
            settings.auto_refresh
        );
        for status in [SignalStatus::Red, SignalStatus::Yellow, SignalStatus::Green] {
            let _ = write!(
                html,
                "<button name=\"{}\" value=\"true\">{} ({})</button><br>",
                override_param(lane, status),
                status.label(),
                lane.name()
            );
        }
        html.push_str("</form>");
    }
    html.push_str("</div><div class=\"grid\">");
    for view in &dashboard.signals {
        let _ = write!(
            html,
            "<div><div>{} Status</div><div class=\"metric\">{}</div>{}</div>",
            view.signal.lane.name(),
            view.label,
            if view.signal.overridden { "<small>manual override</small>" } else { "" }
        );
    }
    html.push_str("</div></div>");
}

fn override_param(lane: Lane, status: SignalStatus) -> String {
    let color = match status {
        SignalStatus::Red => "red",
        SignalStatus::Yellow => "yellow",
        SignalStatus::Green => "green",
    };
    format!("lane{}_{}", lane.number(), color)
}

fn render_max_lane(html: &mut String, dashboard: &Dashboard) {
    let _ = write!(
        html,
        "<div class=\"section\"><h2>🚗 Lane with Maximum Count in Last Interval</h2>\
         <div class=\"info\">{}</div></div>",
        dashboard.max_lane_message()
    );
}

fn render_download(html: &mut String) {
    let _ = write!(
        html,
        "<div class=\"section\"><h2>📥 Download Vehicle Count Report</h2>\
         <a href=\"/api/report.csv\" download=\"{}\">Download .CSV Report</a></div>",
        REPORT_FILE_NAME
    );
}

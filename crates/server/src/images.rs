//! Capability-protected chart images.
//!
//! - `GET /heatmap/{token}`: year-to-date work day quality heatmap
//! - `GET /report/{token}`: meetings and interruptions over the prior two weeks
//!
//! Any path under either prefix is accepted; the token is whatever follows the final `/`.

use axum::{
    extract::State,
    http::{header, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use goodday_core::calendar::{report_window, year_to_date};
use goodday_core::capability::token_from_path;
use goodday_core::charts::{daily_quality, heatmap_chart, interruptions_meetings_chart, ReportRow};
use goodday_core::errors::ApplicationError;
use tracing::{debug, error};
use uuid::Uuid;

use crate::errors::{error_response, integration, persistence};
use crate::state::AppState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Chart {
    Heatmap,
    Report,
}

impl Chart {
    fn name(self) -> &'static str {
        match self {
            Self::Heatmap => "heatmap",
            Self::Report => "report",
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/heatmap/", get(heatmap_image))
        .route("/heatmap/{*path}", get(heatmap_image))
        .route("/report/", get(report_image))
        .route("/report/{*path}", get(report_image))
        .with_state(state)
}

async fn heatmap_image(uri: Uri, State(state): State<AppState>) -> Response {
    respond(Chart::Heatmap, &state, token_from_path(uri.path())).await
}

async fn report_image(uri: Uri, State(state): State<AppState>) -> Response {
    respond(Chart::Report, &state, token_from_path(uri.path())).await
}

async fn respond(chart: Chart, state: &AppState, token: &str) -> Response {
    let correlation_id = Uuid::new_v4().to_string();
    match render_chart(chart, state, token, Utc::now()).await {
        Ok(png) => ([(header::CONTENT_TYPE, "image/png")], png).into_response(),
        Err(failure) => {
            log_failure(chart, &failure, &correlation_id);
            error_response(failure, correlation_id)
        }
    }
}

async fn render_chart(
    chart: Chart,
    state: &AppState,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Vec<u8>, ApplicationError> {
    let viewer = state.engine.verify_at(token, now)?;

    let option = match chart {
        Chart::Heatmap => {
            let window = year_to_date(now);
            let rows = state
                .reflections
                .list_between(&viewer.team_id, &viewer.user_id, window)
                .await
                .map_err(persistence)?;
            heatmap_chart(&daily_quality(&rows, viewer.tz_offset_hours), window)
        }
        Chart::Report => {
            let window = report_window(now, viewer.tz_offset_hours);
            let rows = state
                .reflections
                .list_between(&viewer.team_id, &viewer.user_id, window)
                .await
                .map_err(persistence)?;
            let rows: Vec<ReportRow> = rows
                .iter()
                .map(|reflection| ReportRow::from_reflection(reflection, viewer.tz_offset_hours))
                .collect();
            interruptions_meetings_chart(&rows, window)
        }
    };

    state.renderer.render(&option).await.map_err(integration)
}

fn log_failure(chart: Chart, failure: &ApplicationError, correlation_id: &str) {
    let kind = failure.kind();
    if matches!(failure, ApplicationError::Capability(_)) {
        debug!(
            event_name = "server.image.rejected",
            correlation_id,
            chart = chart.name(),
            error_kind = kind,
            "image request rejected"
        );
    } else {
        error!(
            event_name = "server.image.failed",
            correlation_id,
            chart = chart.name(),
            error_kind = kind,
            error = %failure,
            "image request failed"
        );
    }
}

//! Status dashboard and JSON API for the monitor and the result store

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tokio::sync::watch;

use crate::config::ThresholdConfig;
use crate::export;
use crate::state::StateHandle;
use crate::store::ResultStore;
use crate::VoltcheckError;

/// Dashboard application state
#[derive(Clone)]
pub struct DashboardState {
    pub state: StateHandle,
    pub thresholds: Arc<watch::Sender<ThresholdConfig>>,
    pub store: Arc<dyn ResultStore>,
}

/// Build the dashboard axum router
pub fn build_router(dashboard: DashboardState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/api/status", get(status_handler))
        .route("/api/alerts", get(alerts_handler))
        .route("/api/history", get(history_handler))
        .route(
            "/api/thresholds",
            get(get_thresholds_handler).put(put_thresholds_handler),
        )
        .route(
            "/api/sessions",
            get(list_sessions_handler).delete(delete_all_sessions_handler),
        )
        .route("/api/sessions/export", get(export_sessions_handler))
        .route(
            "/api/sessions/{id}",
            get(get_session_handler)
                .put(rename_session_handler)
                .delete(delete_session_handler),
        )
        .route("/api/samples/export", get(export_samples_handler))
        .with_state(dashboard)
}

/// Maps service errors onto HTTP responses
struct ApiError(VoltcheckError);

impl From<VoltcheckError> for ApiError {
    fn from(err: VoltcheckError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            VoltcheckError::NotFound(_) => StatusCode::NOT_FOUND,
            VoltcheckError::Config(_) | VoltcheckError::Parse(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::warn!("API request failed: {}", self.0);
        }
        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

fn csv_response(body: String, filename: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

async fn index_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let state = dashboard.state.read().await;

    let reading = match &state.display {
        Some(d) => format!(
            "{:.0} mA &middot; {:.3} V &middot; {:.1}&deg;C &middot; {}% &middot; {:.2} W &middot; {}",
            d.current_ma,
            d.voltage_v,
            d.temperature_c,
            d.level,
            d.power_w,
            d.status_label()
        ),
        None => "Waiting for first sample".to_string(),
    };

    let alert_rows: String = state
        .alerts
        .iter()
        .rev()
        .map(|a| {
            format!(
                r#"<tr><td><script>document.write(new Date({}).toLocaleTimeString())</script></td><td>{}</td><td>{}</td></tr>"#,
                a.timestamp_epoch_ms,
                a.event.title(),
                a.event.message()
            )
        })
        .collect();

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Voltcheck</title>
    <script>
        function refreshData() {{
            fetch('/api/status')
                .then(r => r.json())
                .then(data => {{
                    const d = data.display;
                    document.getElementById('reading').textContent = d
                        ? `${{d.current_ma.toFixed(0)}} mA · ${{d.voltage_v.toFixed(3)}} V · ${{d.temperature_c.toFixed(1)}}°C · ${{d.level}}% · ${{d.power_w.toFixed(2)}} W · ${{d.charging ? 'Charging' : 'Not charging'}}`
                        : 'Waiting for first sample';
                    document.getElementById('stability').textContent = data.stability.ready
                        ? `${{(100 - data.stability.cv).toFixed(1)}}%`
                        : 'Collecting';
                }});
        }}
        setInterval(refreshData, 1000);
    </script>
</head>
<body style="font-family: system-ui, sans-serif; max-width: 960px; margin: 0 auto; padding: 1rem;">
    <h1>Voltcheck</h1>
    <section>
        <h2>Now</h2>
        <p id="reading">{reading}</p>
        <p>Stability: <span id="stability">{stability}</span></p>
    </section>
    <section>
        <h2>Alerts</h2>
        <table style="width: 100%; border-collapse: collapse;">
            <thead><tr><th style="text-align: left;">Time</th><th style="text-align: left;">Alert</th><th style="text-align: left;">Detail</th></tr></thead>
            <tbody>{alert_rows}</tbody>
        </table>
    </section>
    <p><a href="/api/sessions/export">Export sessions</a> &middot; <a href="/api/samples/export">Export sample log</a></p>
</body>
</html>"#,
        reading = reading,
        stability = if state.stability.ready {
            format!("{:.1}%", state.stability.stability_pct())
        } else {
            "Collecting".to_string()
        },
        alert_rows = alert_rows,
    );

    Html(html)
}

async fn health_handler() -> impl IntoResponse {
    "OK"
}

async fn status_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let state = dashboard.state.read().await;
    Json(serde_json::json!({
        "display": state.display,
        "stability": state.stability,
        "full_charge_latch": state.latch,
        "samples_seen": state.samples_seen,
        "uptime_seconds": state.started_at.elapsed().as_secs(),
    }))
}

async fn alerts_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let state = dashboard.state.read().await;
    Json(state.alerts.iter().cloned().collect::<Vec<_>>())
}

async fn history_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let state = dashboard.state.read().await;
    Json(state.history.iter().cloned().collect::<Vec<_>>())
}

async fn get_thresholds_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    Json(dashboard.thresholds.borrow().clone())
}

async fn put_thresholds_handler(
    State(dashboard): State<DashboardState>,
    Json(thresholds): Json<ThresholdConfig>,
) -> ApiResult<Json<ThresholdConfig>> {
    thresholds.validate()?;
    tracing::info!("Thresholds updated: {:?}", thresholds);
    dashboard.thresholds.send_replace(thresholds.clone());
    Ok(Json(thresholds))
}

async fn list_sessions_handler(
    State(dashboard): State<DashboardState>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(dashboard.store.list().await?))
}

async fn get_session_handler(
    State(dashboard): State<DashboardState>,
    Path(id): Path<u64>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(dashboard.store.get(id).await?))
}

#[derive(Debug, Deserialize)]
struct RenameRequest {
    name: String,
}

async fn rename_session_handler(
    State(dashboard): State<DashboardState>,
    Path(id): Path<u64>,
    Json(request): Json<RenameRequest>,
) -> ApiResult<StatusCode> {
    let name = request.name.trim();
    if name.is_empty() {
        let err = VoltcheckError::Parse("Session name must not be empty".to_string());
        return Err(err.into());
    }
    dashboard.store.rename(id, name).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_session_handler(
    State(dashboard): State<DashboardState>,
    Path(id): Path<u64>,
) -> ApiResult<StatusCode> {
    dashboard.store.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_all_sessions_handler(
    State(dashboard): State<DashboardState>,
) -> ApiResult<StatusCode> {
    dashboard.store.delete_all().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn export_sessions_handler(State(dashboard): State<DashboardState>) -> ApiResult<Response> {
    let sessions = dashboard.store.list().await?;
    Ok(csv_response(
        export::sessions_to_csv(&sessions)?,
        "voltcheck_sessions.csv",
    ))
}

async fn export_samples_handler(State(dashboard): State<DashboardState>) -> ApiResult<Response> {
    let state = dashboard.state.read().await;
    Ok(csv_response(
        export::sample_log_to_csv(&state.sample_log)?,
        "voltcheck_samples.csv",
    ))
}

//! HTTP handlers for API endpoints.

use crate::camera::CameraSettings;
use crate::error::TimelapseError;
use crate::timelapse::{TimelapseConfig, TimelapseStatus};
use crate::web::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};

/// Error returned by API handlers, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError(TimelapseError);

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            TimelapseError::AlreadyRunning => StatusCode::CONFLICT,
            TimelapseError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
            TimelapseError::Capture(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TimelapseError> for ApiError {
    fn from(err: TimelapseError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        } else {
            warn!("Request rejected: {}", self.0);
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// Body of `POST /api/timelapse`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartRequest {
    pub interval_secs: f64,
    pub total_count: u32,
    #[serde(default)]
    pub name: Option<String>,
}

impl StartRequest {
    fn into_config(self) -> crate::Result<TimelapseConfig> {
        let config = TimelapseConfig::from_secs_f64(self.interval_secs, self.total_count)?;
        Ok(match self.name {
            Some(name) => config.with_name(name),
            None => config,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartResponse {
    pub run_id: u64,
    pub status: TimelapseStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewResponse {
    pub file: String,
    pub url: String,
}

/// Health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "pi-timelapse",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "running": state.controller.is_running(),
        "websocket_clients": state.client_count().await,
    }))
}

/// Current status snapshot.
pub async fn get_status(State(state): State<AppState>) -> Json<TimelapseStatus> {
    Json(state.controller.status())
}

/// Start a new run.
pub async fn start_timelapse(
    State(state): State<AppState>,
    Json(request): Json<StartRequest>,
) -> Result<(StatusCode, Json<StartResponse>), ApiError> {
    let config = request.into_config()?;
    // directory creation and the manifest write block
    let controller = state.controller.clone();
    let handle = tokio::task::spawn_blocking(move || controller.start(config))
        .await
        .map_err(|e| TimelapseError::system_error(format!("start task failed: {}", e)))??;
    info!("Time-lapse {} started over HTTP", handle.run_id());
    Ok((
        StatusCode::ACCEPTED,
        Json(StartResponse {
            run_id: handle.run_id(),
            status: handle.status(),
        }),
    ))
}

/// Ask the active run to stop. The returned snapshot may still be running.
pub async fn stop_timelapse(State(state): State<AppState>) -> (StatusCode, Json<TimelapseStatus>) {
    state.controller.stop();
    (StatusCode::ACCEPTED, Json(state.controller.status()))
}

pub async fn get_camera(State(state): State<AppState>) -> Json<CameraSettings> {
    Json(state.controller.camera_settings())
}

pub async fn update_camera(
    State(state): State<AppState>,
    Json(settings): Json<CameraSettings>,
) -> Result<Json<CameraSettings>, ApiError> {
    state.controller.update_settings(settings)?;
    Ok(Json(state.controller.camera_settings()))
}

/// Take one preview image into the output root.
pub async fn capture_preview(
    State(state): State<AppState>,
) -> Result<Json<PreviewResponse>, ApiError> {
    let options = state.controller.options();
    let file = format!("preview.{}", options.image_extension);
    let destination = options.output_root.join(&file);

    state.controller.capture_preview(&destination).await?;
    Ok(Json(PreviewResponse {
        url: format!("/captures/{}", file),
        file,
    }))
}

/// Serve the built-in control page.
pub async fn default_index() -> Html<&'static str> {
    Html(DEFAULT_INDEX_HTML)
}

const DEFAULT_INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Pi Time-lapse</title>
    <style>
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            max-width: 480px;
            margin: 0 auto;
            padding: 20px;
            color: #333;
        }
        label { display: block; margin: 10px 0 4px; font-weight: 600; }
        input { width: 100%; padding: 6px; box-sizing: border-box; }
        button { margin-top: 16px; padding: 8px 16px; }
        progress { width: 100%; height: 20px; }
        #status { margin-top: 20px; padding: 12px; background: #f2f2f2; border-radius: 8px; }
        .error { color: #c0392b; }
    </style>
</head>
<body>
    <h1>Pi Time-lapse</h1>

    <form id="start">
        <label for="interval">Interval (seconds)</label>
        <input id="interval" type="number" min="0" step="0.1" value="10">
        <label for="count">Number of images</label>
        <input id="count" type="number" min="1" value="4">
        <button type="submit">Start</button>
        <button type="button" id="stop">Stop</button>
        <button type="button" id="preview">Preview</button>
    </form>

    <div id="status">
        <div id="summary">Connecting...</div>
        <progress id="progress" max="1" value="0"></progress>
        <div id="remaining"></div>
        <div id="error" class="error"></div>
    </div>
    <p><img id="preview-image" alt="" style="max-width: 100%"></p>

    <script>
        let ws;

        function render(status) {
            const total = status.total_count || 0;
            document.getElementById('progress').value = total ? status.images_taken / total : 0;
            document.getElementById('summary').textContent = status.running
                ? `Image ${status.images_taken} of ${total}, next in ${Math.max(0, Math.ceil(status.time_to_next_capture))}s`
                : `${status.state} (${status.images_taken} of ${total})`;
            document.getElementById('remaining').textContent = status.running
                ? `About ${Math.round(status.time_remaining_total)}s remaining`
                : '';
            document.getElementById('error').textContent = status.last_error || '';
        }

        async function post(url, body) {
            const response = await fetch(url, {
                method: 'POST',
                headers: { 'Content-Type': 'application/json' },
                body: body ? JSON.stringify(body) : undefined,
            });
            const data = await response.json();
            document.getElementById('error').textContent = response.ok ? '' : data.error;
            return data;
        }

        function connectWebSocket() {
            const protocol = window.location.protocol === 'https:' ? 'wss:' : 'ws:';
            ws = new WebSocket(`${protocol}//${window.location.host}/ws`);
            ws.onmessage = (event) => render(JSON.parse(event.data));
            ws.onclose = () => setTimeout(connectWebSocket, 2000);
        }

        document.getElementById('start').onsubmit = (event) => {
            event.preventDefault();
            post('/api/timelapse', {
                interval_secs: parseFloat(document.getElementById('interval').value),
                total_count: parseInt(document.getElementById('count').value, 10),
            });
        };
        document.getElementById('stop').onclick = () => post('/api/timelapse/stop');
        document.getElementById('preview').onclick = async () => {
            const data = await post('/api/preview');
            if (data.url) {
                document.getElementById('preview-image').src = `${data.url}?t=${Date.now()}`;
            }
        };

        connectWebSocket();
        fetch('/api/status').then((r) => r.json()).then(render);
    </script>
</body>
</html>"#;

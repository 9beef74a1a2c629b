//! Web application router and middleware setup.

use crate::web::{handlers, websocket, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{info, warn};

/// Create the main axum application with all routes and middleware.
pub fn create_app(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/", get(handlers::default_index))
        // API routes
        .route("/api/health", get(handlers::health_check))
        .route("/api/status", get(handlers::get_status))
        .route("/api/timelapse", post(handlers::start_timelapse))
        .route("/api/timelapse/stop", post(handlers::stop_timelapse))
        .route(
            "/api/camera",
            get(handlers::get_camera).put(handlers::update_camera),
        )
        .route("/api/preview", post(handlers::capture_preview))
        // WebSocket route
        .route("/ws", get(websocket::websocket_handler));

    match &state.config.captures_path {
        Some(path) if path.is_dir() => {
            info!("Serving captures from: {:?}", path);
            app = app.nest_service("/captures", ServeDir::new(path));
        }
        Some(path) => warn!("Captures path {:?} does not exist, not serving images", path),
        None => {}
    }

    let enable_cors = state.config.enable_cors;
    let mut app = app.with_state(state);

    if enable_cors {
        app = app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    app.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::SimulatedCamera;
    use crate::timelapse::{ControllerOptions, TimelapseController, TimelapseStatus};
    use crate::web::WebConfig;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_app() -> (Router, Arc<TimelapseController>, TempDir) {
        let root = tempfile::tempdir().unwrap();
        let controller = Arc::new(
            TimelapseController::new(SimulatedCamera::new(), ControllerOptions::new(root.path()))
                .unwrap(),
        );
        let config = WebConfig::default().with_captures_path(Some(root.path().to_path_buf()));
        let app = create_app(AppState::new(controller.clone(), config));
        (app, controller, root)
    }

    fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_and_idle_status() {
        let (app, _controller, _root) = test_app();

        let response = app
            .clone()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let health = body_json(response).await;
        assert_eq!(health["status"], "ok");
        assert_eq!(health["running"], false);

        let response = app
            .oneshot(Request::get("/api/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let status: TimelapseStatus =
            serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(status, TimelapseStatus::idle());
    }

    #[tokio::test]
    async fn test_start_conflict_and_stop() {
        let (app, controller, root) = test_app();
        let body = json!({ "interval_secs": 60.0, "total_count": 3, "name": "garden" });

        let response = app
            .clone()
            .oneshot(json_request(Method::POST, "/api/timelapse", body.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let started = body_json(response).await;
        assert_eq!(started["run_id"], 1);
        assert_eq!(started["status"]["running"], true);
        assert_eq!(started["status"]["destination_name"], "garden");
        assert!(root.path().join("garden").is_dir());

        let response = app
            .clone()
            .oneshot(json_request(Method::POST, "/api/timelapse", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert!(body_json(response).await["error"].is_string());

        let response = app
            .clone()
            .oneshot(json_request(Method::POST, "/api/preview", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = app
            .oneshot(json_request(Method::POST, "/api/timelapse/stop", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let mut status = controller.subscribe();
        let finished = status.wait_for(|s| s.state.is_terminal()).await.unwrap().clone();
        assert!(!finished.running);
        assert!(finished.images_taken <= 3);
    }

    #[tokio::test]
    async fn test_invalid_start_is_bad_request() {
        let (app, controller, _root) = test_app();

        let response = app
            .oneshot(json_request(
                Method::POST,
                "/api/timelapse",
                json!({ "interval_secs": 5.0, "total_count": 0 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(!controller.is_running());
    }

    #[tokio::test]
    async fn test_overlong_start_is_bad_request() {
        let (app, controller, root) = test_app();

        let response = app
            .oneshot(json_request(
                Method::POST,
                "/api/timelapse",
                json!({ "interval_secs": 1e18, "total_count": 100, "name": "forever" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(!controller.is_running());
        assert!(!root.path().join("forever").exists());
    }

    #[tokio::test]
    async fn test_camera_settings_roundtrip() {
        let (app, controller, _root) = test_app();

        let response = app
            .clone()
            .oneshot(json_request(
                Method::PUT,
                "/api/camera",
                json!({ "iso": 400, "shutter_speed_us": 20000 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(controller.camera_settings().iso, 400);

        let response = app
            .clone()
            .oneshot(json_request(Method::PUT, "/api/camera", json!({ "iso": 123 })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(controller.camera_settings().iso, 400);

        let response = app
            .oneshot(Request::get("/api/camera").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(response).await["shutter_speed_us"], 20000);
    }

    #[tokio::test]
    async fn test_preview_is_served_from_captures() {
        let (app, _controller, root) = test_app();

        let response = app
            .clone()
            .oneshot(json_request(Method::POST, "/api/preview", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let preview = body_json(response).await;
        assert_eq!(preview["file"], "preview.jpg");
        assert!(root.path().join("preview.jpg").exists());

        let url = preview["url"].as_str().unwrap().to_string();
        let response = app
            .oneshot(Request::get(url.as_str()).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

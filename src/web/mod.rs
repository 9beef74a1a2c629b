//! Web server and API endpoints for controlling time-lapses remotely.
//!
//! JSON endpoints start and stop runs and edit camera settings; a WebSocket
//! pushes the status snapshot to connected clients.

pub mod config;
pub mod handlers;
pub mod router;
pub mod websocket;

// Re-export commonly used items
pub use config::WebConfig;
pub use router::create_app;

use crate::error::{Result, TimelapseError};
use crate::timelapse::TimelapseController;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// A connected WebSocket client.
#[derive(Debug, Clone)]
pub struct Client {
    pub id: String,
    pub connected_at: DateTime<Utc>,
}

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<TimelapseController>,
    pub config: WebConfig,
    clients: Arc<RwLock<HashMap<String, Client>>>,
}

impl AppState {
    pub fn new(controller: Arc<TimelapseController>, config: WebConfig) -> Self {
        Self {
            controller,
            config,
            clients: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Get the number of connected WebSocket clients.
    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }

    pub(crate) async fn register_client(&self, id: &str) {
        self.clients.write().await.insert(
            id.to_string(),
            Client {
                id: id.to_string(),
                connected_at: Utc::now(),
            },
        );
    }

    pub(crate) async fn remove_client(&self, id: &str) -> Option<Client> {
        self.clients.write().await.remove(id)
    }
}

/// Serve the web interface for `controller` until the server stops.
pub async fn start_web_server(
    config: WebConfig,
    controller: Arc<TimelapseController>,
) -> Result<()> {
    let addr = config
        .bind_address()
        .parse::<SocketAddr>()
        .map_err(|e| TimelapseError::config_error(format!("Invalid bind address: {}", e)))?;

    let app = create_app(AppState::new(controller, config));

    info!("Starting time-lapse web server on http://{}", addr);
    info!("API endpoint: http://{}/api/status", addr);
    info!("WebSocket endpoint: ws://{}/ws", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| TimelapseError::web_server_error(format!("Failed to bind to address: {}", e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| TimelapseError::web_server_error(format!("Server error: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::SimulatedCamera;
    use crate::timelapse::ControllerOptions;

    #[tokio::test]
    async fn test_client_registry() {
        let root = tempfile::tempdir().unwrap();
        let controller =
            TimelapseController::new(SimulatedCamera::new(), ControllerOptions::new(root.path()))
                .unwrap();
        let state = AppState::new(Arc::new(controller), WebConfig::default());

        let before = Utc::now();
        state.register_client("a").await;
        state.register_client("b").await;
        assert_eq!(state.client_count().await, 2);

        let client = state.remove_client("a").await.unwrap();
        assert_eq!(client.id, "a");
        assert!(client.connected_at >= before);
        assert!(state.remove_client("a").await.is_none());
        assert_eq!(state.client_count().await, 1);
    }
}

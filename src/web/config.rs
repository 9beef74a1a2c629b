//! Web server configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the web server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebConfig {
    /// Host to bind the server to
    pub host: String,
    /// Port to bind the server to
    pub port: u16,
    /// Whether to enable CORS
    pub enable_cors: bool,
    /// Directory served read-only under `/captures`
    pub captures_path: Option<PathBuf>,
    /// Maximum number of WebSocket connections
    pub max_websocket_connections: usize,
    /// How often WebSocket clients receive a status snapshot, in milliseconds
    pub status_push_ms: u64,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: crate::DEFAULT_WEB_PORT,
            enable_cors: true,
            captures_path: None,
            max_websocket_connections: 100,
            status_push_ms: crate::DEFAULT_STATUS_PUSH_MS,
        }
    }
}

impl WebConfig {
    /// Create a new web configuration with custom host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Set the host for the web server.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port for the web server.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Enable or disable CORS.
    pub fn with_cors(mut self, enable_cors: bool) -> Self {
        self.enable_cors = enable_cors;
        self
    }

    /// Serve captured images from `path`.
    pub fn with_captures_path(mut self, path: Option<PathBuf>) -> Self {
        self.captures_path = path;
        self
    }

    /// Set the maximum number of WebSocket connections.
    pub fn with_max_websocket_connections(mut self, max: usize) -> Self {
        self.max_websocket_connections = max;
        self
    }

    /// Set the WebSocket status push interval.
    pub fn with_status_push_ms(mut self, push_ms: u64) -> Self {
        self.status_push_ms = push_ms;
        self
    }

    /// Get the full bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn status_push_interval(&self) -> Duration {
        Duration::from_millis(self.status_push_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WebConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.status_push_interval(), Duration::from_millis(500));
        assert!(config.captures_path.is_none());
    }

    #[test]
    fn test_zero_push_interval_is_clamped() {
        let config = WebConfig::default().with_status_push_ms(0);
        assert_eq!(config.status_push_interval(), Duration::from_millis(1));
    }
}

//! Error handling for the time-lapse controller crate.

use crate::camera::CaptureError;
use std::path::PathBuf;

/// A specialized `Result` type for time-lapse operations.
pub type Result<T> = std::result::Result<T, TimelapseError>;

/// The main error type for controller, storage and web operations.
#[derive(Debug, thiserror::Error)]
pub enum TimelapseError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A run is already active on this controller
    #[error("A time-lapse is already running")]
    AlreadyRunning,

    /// The output location could not be created or written
    #[error("Storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The capture device failed
    #[error("Capture failed: {0}")]
    Capture(#[from] CaptureError),

    /// Time-lapse or camera configuration violates a precondition
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Application configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Web server error
    #[error("Web server error: {0}")]
    WebServer(String),

    /// GPIO operation failed (only available with gpio feature)
    #[cfg(feature = "gpio")]
    #[error("GPIO error: {0}")]
    Gpio(String),

    /// Generic system error
    #[error("System error: {0}")]
    System(String),
}

impl TimelapseError {
    /// Create a new storage error for the given path
    pub fn storage_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Create a new invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new web server error
    pub fn web_server_error(msg: impl Into<String>) -> Self {
        Self::WebServer(msg.into())
    }

    /// Create a new GPIO error
    #[cfg(feature = "gpio")]
    pub fn gpio_error(msg: impl Into<String>) -> Self {
        Self::Gpio(msg.into())
    }

    /// Create a new generic system error
    pub fn system_error(msg: impl Into<String>) -> Self {
        Self::System(msg.into())
    }
}

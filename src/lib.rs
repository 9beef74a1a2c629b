//! # Pi Time-lapse - Raspberry Pi time-lapse camera controller
//!
//! Takes photographs at a fixed cadence for a fixed number of images while
//! the camera's own capture time varies, and lets buttons or a web page
//! start, stop and watch the run.
//!
//! ## Features
//!
//! - **Drift-free scheduling**: each capture is timed from the start of the previous one
//! - **Prompt cancellation**: a stop request is honoured within one tick
//! - **Consistent status**: snapshots are published whole, never half-updated
//! - **Camera backends**: `rpicam-still` on the Pi, a simulated camera elsewhere
//! - **Control surfaces**: five-way button menu (feature-gated GPIO) and a web API
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pi_timelapse::{
//!     CameraSettings, ControllerOptions, RpiCamera, TimelapseConfig, TimelapseController,
//! };
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let camera = RpiCamera::new(CameraSettings::default());
//!     let controller = TimelapseController::new(camera, ControllerOptions::new("."))?;
//!
//!     // 600 images, one every 15 seconds
//!     let run = controller.start(TimelapseConfig::new(Duration::from_secs(15), 600))?;
//!     let status = run.join().await?;
//!     println!("{}", status);
//!     Ok(())
//! }
//! ```

pub mod buttons;
pub mod camera;
pub mod error;
pub mod timelapse;
pub mod web;

// Re-export public API
pub use camera::{CameraSettings, CaptureDevice, CaptureError, RpiCamera, SimulatedCamera};
pub use error::{Result, TimelapseError};
pub use timelapse::{
    CancelToken, ControllerOptions, RunHandle, RunState, Schedule, TimelapseConfig,
    TimelapseController, TimelapseStatus,
};
pub use web::{start_web_server, WebConfig};

/// The default cancellation tick in milliseconds
pub const DEFAULT_TICK_MS: u64 = 250;

/// The default web server port
pub const DEFAULT_WEB_PORT: u16 = 8080;

/// The default WebSocket status push interval in milliseconds
pub const DEFAULT_STATUS_PUSH_MS: u64 = 500;

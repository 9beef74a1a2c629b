//! Time-lapse scheduling and the capture loop controller.
//!
//! A [`TimelapseController`] owns the camera. [`TimelapseController::start`]
//! spawns a run that captures, waits out the rest of the interval in short
//! cancellable ticks, and repeats until the image count is reached or a stop
//! is requested. Status is published as whole [`TimelapseStatus`] snapshots
//! that any thread can read without touching the camera.

pub mod config;
pub mod controller;
mod run;
pub mod schedule;
pub mod status;
pub mod storage;
pub mod ticker;

// Re-export commonly used items
pub use config::{ControllerOptions, TimelapseConfig};
pub use controller::{RunHandle, TimelapseController};
pub use schedule::Schedule;
pub use status::{RunState, TimelapseStatus};
pub use storage::{RunDirectory, RunManifest};
pub use ticker::{CancelToken, Ticker, Wake};

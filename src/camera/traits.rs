//! The capture device capability driven by the time-lapse controller.

use crate::camera::settings::CameraSettings;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Failure reported by a capture device.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// The device or its driver reported a failure
    #[error("camera device error: {0}")]
    Device(String),

    /// Writing the image failed
    #[error("I/O error while capturing: {0}")]
    Io(#[from] std::io::Error),

    /// The capture did not complete in time
    #[error("capture did not finish within {0:?}")]
    Timeout(Duration),

    /// The device cannot be reached at all
    #[error("camera unavailable: {0}")]
    Unavailable(String),
}

/// A camera that can produce one image per call.
///
/// A capture may take anywhere from tens of milliseconds to several
/// seconds. The controller calls [`capture`](CaptureDevice::capture) from a
/// single task at a time and never abandons a call halfway through, so
/// implementations may assume sequential use. Drivers that block should move
/// their work off the async workers (e.g. `tokio::task::spawn_blocking` or a
/// child process).
#[async_trait]
pub trait CaptureDevice: Send + 'static {
    /// Capture a single image with the current settings and write it to
    /// `destination`.
    async fn capture(&mut self, destination: &Path) -> Result<(), CaptureError>;

    /// Settings that the next capture will use.
    fn settings(&self) -> &CameraSettings;

    /// Replace the capture settings.
    fn configure(&mut self, settings: CameraSettings) -> Result<(), CaptureError>;

    /// Release any resources held after a run finishes.
    async fn release(&mut self) {}

    /// Short device description for logs.
    fn describe(&self) -> String {
        "camera".to_string()
    }
}

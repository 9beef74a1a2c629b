//! Camera access for the time-lapse controller.
//!
//! The controller only needs a device that can write one image to a named
//! file. [`RpiCamera`] does that with the camera module on a Raspberry Pi;
//! [`SimulatedCamera`] stands in on development machines.

pub mod rpicam;
pub mod settings;
pub mod simulated;
pub mod traits;

// Re-export commonly used items
pub use rpicam::RpiCamera;
pub use settings::CameraSettings;
pub use simulated::SimulatedCamera;
pub use traits::{CaptureDevice, CaptureError};

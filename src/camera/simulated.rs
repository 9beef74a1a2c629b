//! Stand-in camera for hosts without a camera module.

use crate::camera::settings::CameraSettings;
use crate::camera::traits::{CaptureDevice, CaptureError};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Writes a small text placeholder per capture after a fixed latency.
#[derive(Debug, Clone, Default)]
pub struct SimulatedCamera {
    settings: CameraSettings,
    latency: Duration,
    captures: u64,
}

impl SimulatedCamera {
    /// Create a simulated camera with default settings and no latency.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every capture take `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Start from the given settings.
    pub fn with_settings(mut self, settings: CameraSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Number of captures performed so far.
    pub fn captures(&self) -> u64 {
        self.captures
    }
}

#[async_trait]
impl CaptureDevice for SimulatedCamera {
    async fn capture(&mut self, destination: &Path) -> Result<(), CaptureError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.captures += 1;
        let body = format!(
            "simulated capture {} at {} ({}x{}, iso {})\n",
            self.captures,
            chrono::Utc::now().to_rfc3339(),
            self.settings.width,
            self.settings.height,
            self.settings.iso
        );
        tokio::fs::write(destination, body).await?;
        Ok(())
    }

    fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    fn configure(&mut self, settings: CameraSettings) -> Result<(), CaptureError> {
        self.settings = settings;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("simulated camera ({:?} latency)", self.latency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_writes_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.jpg");
        let mut camera = SimulatedCamera::new();

        camera.capture(&path).await.unwrap();

        assert_eq!(camera.captures(), 1);
        let body = std::fs::read_to_string(&path).unwrap();
        assert!(body.starts_with("simulated capture 1"));
    }

    #[tokio::test]
    async fn test_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut camera = SimulatedCamera::new();

        let err = camera
            .capture(&dir.path().join("missing").join("frame.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, CaptureError::Io(_)));
        assert_eq!(camera.captures(), 1);
    }
}

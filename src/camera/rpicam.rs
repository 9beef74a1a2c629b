//! Camera module access through the `rpicam-still` command line tool.

use crate::camera::settings::CameraSettings;
use crate::camera::traits::{CaptureDevice, CaptureError};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

/// Default still capture program on Raspberry Pi OS Bookworm.
pub const DEFAULT_STILL_PROGRAM: &str = "rpicam-still";

/// Upper bound for a single capture, long exposures included.
pub const DEFAULT_CAPTURE_TIMEOUT: Duration = Duration::from_secs(60);

/// Raspberry Pi camera module driven by one `rpicam-still` process per image.
#[derive(Debug, Clone)]
pub struct RpiCamera {
    program: String,
    settings: CameraSettings,
    capture_timeout: Duration,
}

impl RpiCamera {
    /// Create a camera with the given settings.
    pub fn new(settings: CameraSettings) -> Self {
        Self {
            program: DEFAULT_STILL_PROGRAM.to_string(),
            settings,
            capture_timeout: DEFAULT_CAPTURE_TIMEOUT,
        }
    }

    /// Use a different still program (e.g. `libcamera-still` on older images).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Set the per-capture timeout.
    pub fn with_capture_timeout(mut self, capture_timeout: Duration) -> Self {
        self.capture_timeout = capture_timeout;
        self
    }

    /// Build the argument list for capturing into `destination`.
    pub fn still_args(&self, destination: &Path) -> Vec<String> {
        let s = &self.settings;
        let mut args = vec![
            "--nopreview".to_string(),
            "--immediate".to_string(),
            "--width".to_string(),
            s.width.to_string(),
            "--height".to_string(),
            s.height.to_string(),
            "--quality".to_string(),
            s.quality.to_string(),
        ];

        if s.shutter_speed_us > 0 {
            args.push("--shutter".to_string());
            args.push(s.shutter_speed_us.to_string());
        }
        if s.iso > 0 {
            // rpicam expresses ISO as analogue gain, 1.0 == ISO 100
            args.push("--gain".to_string());
            args.push(format!("{:.2}", s.iso as f32 / 100.0));
        }
        if s.awb_mode != "auto" {
            args.push("--awb".to_string());
            args.push(s.awb_mode.clone());
        }
        if s.exposure_mode != "auto" {
            args.push("--exposure".to_string());
            args.push(s.exposure_mode.clone());
        }
        if s.brightness != 50 {
            args.push("--brightness".to_string());
            args.push(format!("{:.2}", (s.brightness as f32 - 50.0) / 50.0));
        }
        for (flag, value) in [
            ("--contrast", s.contrast),
            ("--sharpness", s.sharpness),
            ("--saturation", s.saturation),
        ] {
            if value != 0 {
                args.push(flag.to_string());
                args.push(format!("{:.2}", 1.0 + value as f32 / 100.0));
            }
        }
        if s.hflip {
            args.push("--hflip".to_string());
        }
        if s.vflip {
            args.push("--vflip".to_string());
        }

        args.push("--output".to_string());
        args.push(destination.to_string_lossy().into_owned());
        args
    }
}

#[async_trait]
impl CaptureDevice for RpiCamera {
    async fn capture(&mut self, destination: &Path) -> Result<(), CaptureError> {
        let args = self.still_args(destination);
        debug!("Running {} {}", self.program, args.join(" "));

        let child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    CaptureError::Unavailable(format!("{} not found in PATH", self.program))
                }
                _ => CaptureError::Io(e),
            })?;

        // Dropping the child on timeout kills the process
        let output = match timeout(self.capture_timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => return Err(CaptureError::Timeout(self.capture_timeout)),
        };

        if !output.status.success() {
            return Err(CaptureError::Device(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

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
        format!(
            "{} ({}x{})",
            self.program, self.settings.width, self.settings.height
        )
    }
}

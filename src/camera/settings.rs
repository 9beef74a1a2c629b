//! Camera exposure and output settings.

use crate::error::{Result, TimelapseError};
use serde::{Deserialize, Serialize};

/// ISO values accepted by the sensor (0 selects automatic gain).
pub const SUPPORTED_ISO: [u32; 8] = [0, 100, 200, 320, 400, 500, 640, 800];

/// Settings applied to every capture of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Sensor ISO, 0 for automatic
    pub iso: u32,
    /// Shutter speed in microseconds, 0 for automatic
    pub shutter_speed_us: u32,
    /// Brightness 0..=100 (50 is neutral)
    pub brightness: u8,
    /// Contrast -100..=100
    pub contrast: i8,
    /// Sharpness -100..=100
    pub sharpness: i8,
    /// Saturation -100..=100
    pub saturation: i8,
    /// White balance mode (e.g. "auto", "daylight")
    pub awb_mode: String,
    /// Exposure mode (e.g. "auto", "sport", "long")
    pub exposure_mode: String,
    /// Mirror horizontally
    pub hflip: bool,
    /// Mirror vertically
    pub vflip: bool,
    /// JPEG quality 0..=100
    pub quality: u8,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            iso: 0,
            shutter_speed_us: 0,
            brightness: 50,
            contrast: 0,
            sharpness: 0,
            saturation: 0,
            awb_mode: "auto".to_string(),
            exposure_mode: "auto".to_string(),
            hflip: false,
            vflip: false,
            quality: 100,
        }
    }
}

impl CameraSettings {
    /// Set the output resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the sensor ISO.
    pub fn with_iso(mut self, iso: u32) -> Self {
        self.iso = iso;
        self
    }

    /// Set a manual shutter speed in microseconds.
    pub fn with_shutter_speed_us(mut self, shutter_speed_us: u32) -> Self {
        self.shutter_speed_us = shutter_speed_us;
        self
    }

    /// Set the JPEG quality.
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    /// Set horizontal and vertical flip.
    pub fn with_flip(mut self, hflip: bool, vflip: bool) -> Self {
        self.hflip = hflip;
        self.vflip = vflip;
        self
    }

    /// Whether the sensor chooses exposure on its own.
    pub fn is_auto_exposure(&self) -> bool {
        self.iso == 0 && self.shutter_speed_us == 0
    }

    /// Check every value against the range the sensor accepts.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(TimelapseError::invalid_config(format!(
                "resolution must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if !SUPPORTED_ISO.contains(&self.iso) {
            return Err(TimelapseError::invalid_config(format!(
                "unsupported ISO {} (expected one of {:?})",
                self.iso, SUPPORTED_ISO
            )));
        }
        if self.brightness > 100 {
            return Err(TimelapseError::invalid_config(format!(
                "brightness {} is outside 0..=100",
                self.brightness
            )));
        }
        for (label, value) in [
            ("contrast", self.contrast),
            ("sharpness", self.sharpness),
            ("saturation", self.saturation),
        ] {
            if !(-100..=100).contains(&value) {
                return Err(TimelapseError::invalid_config(format!(
                    "{} {} is outside -100..=100",
                    label, value
                )));
            }
        }
        if self.quality > 100 {
            return Err(TimelapseError::invalid_config(format!(
                "quality {} is outside 0..=100",
                self.quality
            )));
        }
        if self.awb_mode.trim().is_empty() || self.exposure_mode.trim().is_empty() {
            return Err(TimelapseError::invalid_config(
                "white balance and exposure modes must not be empty",
            ));
        }
        Ok(())
    }
}

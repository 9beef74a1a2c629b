//! Run configuration and controller options.

use crate::error::{Result, TimelapseError};
use crate::timelapse::schedule::Schedule;
use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Write};
use std::path::PathBuf;
use std::time::Duration;

/// Parameters of a single time-lapse run. Immutable once the run starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelapseConfig {
    /// Time between the starts of successive captures
    pub interval: Duration,
    /// Number of images to take, at least 1
    pub total_count: u32,
    /// Explicit output name; derived from the start time when `None`
    pub name: Option<String>,
}

impl TimelapseConfig {
    /// Create a configuration with a name derived from the start time.
    pub fn new(interval: Duration, total_count: u32) -> Self {
        Self {
            interval,
            total_count,
            name: None,
        }
    }

    /// Create a configuration from an interval in (possibly fractional) seconds.
    pub fn from_secs_f64(interval_secs: f64, total_count: u32) -> Result<Self> {
        let interval = Duration::try_from_secs_f64(interval_secs).map_err(|_| {
            TimelapseError::invalid_config(format!(
                "interval must be a non-negative number of seconds, got {}",
                interval_secs
            ))
        })?;
        Ok(Self::new(interval, total_count))
    }

    /// Use a fixed output name instead of the start time.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Check the preconditions for starting a run.
    pub fn validate(&self) -> Result<()> {
        if self.total_count < 1 {
            return Err(TimelapseError::invalid_config(
                "total image count must be at least 1",
            ));
        }
        if Schedule::from(self).checked_planned_duration().is_none() {
            return Err(TimelapseError::invalid_config(format!(
                "{} images every {:.0}s would run longer than supported",
                self.total_count,
                self.interval.as_secs_f64()
            )));
        }
        if let Some(name) = &self.name {
            validate_run_name(name)?;
        }
        Ok(())
    }

    /// Planned time from the first to the last capture.
    pub fn planned_duration(&self) -> Duration {
        Schedule::from(self).planned_duration()
    }
}

/// Reject names that would escape the output root or produce no directory.
pub fn validate_run_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(TimelapseError::invalid_config("run name must not be empty"));
    }
    if name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(TimelapseError::invalid_config(format!(
            "run name {:?} must be a single path component",
            name
        )));
    }
    Ok(())
}

/// Options shared by every run of a controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerOptions {
    /// Directory that receives one sub-directory per run
    pub output_root: PathBuf,
    /// Longest single wait between status updates, in milliseconds
    pub tick_ms: u64,
    /// strftime pattern for run names, applied to the local start time
    pub name_format: String,
    /// File extension for captured images
    pub image_extension: String,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("."),
            tick_ms: crate::DEFAULT_TICK_MS,
            name_format: "%Y%m%d_%H%M".to_string(),
            image_extension: "jpg".to_string(),
        }
    }
}

impl ControllerOptions {
    /// Create options writing runs below `output_root`.
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            ..Default::default()
        }
    }

    /// Set the output root directory.
    pub fn with_output_root(mut self, output_root: impl Into<PathBuf>) -> Self {
        self.output_root = output_root.into();
        self
    }

    /// Set the wait tick in milliseconds.
    pub fn with_tick_ms(mut self, tick_ms: u64) -> Self {
        self.tick_ms = tick_ms;
        self
    }

    /// Set the strftime pattern used for run names.
    pub fn with_name_format(mut self, name_format: impl Into<String>) -> Self {
        self.name_format = name_format.into();
        self
    }

    /// Set the image file extension.
    pub fn with_image_extension(mut self, extension: impl Into<String>) -> Self {
        self.image_extension = extension.into();
        self
    }

    /// The wait tick, never shorter than one millisecond.
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    /// Check the options before building a controller.
    pub fn validate(&self) -> Result<()> {
        if self.tick_ms == 0 {
            return Err(TimelapseError::config_error("tick_ms must be at least 1"));
        }
        if self.image_extension.is_empty() || self.image_extension.contains(['/', '\\', '.']) {
            return Err(TimelapseError::config_error(format!(
                "invalid image extension {:?}",
                self.image_extension
            )));
        }
        Ok(())
    }

    /// Format the run name for a run starting at `started_at`.
    pub fn destination_name<Tz>(&self, started_at: &DateTime<Tz>) -> Result<String>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let mut name = String::new();
        write!(name, "{}", started_at.format(&self.name_format)).map_err(|_| {
            TimelapseError::config_error(format!("invalid name format {:?}", self.name_format))
        })?;
        validate_run_name(&name)?;
        Ok(name)
    }
}

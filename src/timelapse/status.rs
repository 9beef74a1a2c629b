//! Observable state of the controller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a run. `Completed`, `Cancelled` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// No run has been started yet
    #[default]
    Idle,
    /// Capturing or waiting for the next capture
    Running,
    /// All images were taken
    Completed,
    /// Stopped on request
    Cancelled,
    /// Aborted by a capture error
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }
}

/// Immutable snapshot of the current (or most recent) run.
///
/// Snapshots are published whole, so readers never see a half-updated one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelapseStatus {
    /// Identifier of the run this snapshot describes, 0 before the first run
    pub run_id: u64,
    pub state: RunState,
    pub running: bool,
    pub images_taken: u32,
    pub total_count: u32,
    pub interval_secs: f64,
    /// Seconds until the next capture; negative while a capture overruns
    pub time_to_next_capture: f64,
    /// Estimated seconds until the run completes
    pub time_remaining_total: f64,
    pub destination_name: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    /// Advisory; real completion depends on capture latency
    pub scheduled_finish_time: Option<DateTime<Utc>>,
    /// File name of the most recent image
    pub last_image: Option<String>,
    pub last_error: Option<String>,
}

impl TimelapseStatus {
    /// Status reported before any run has started.
    pub fn idle() -> Self {
        Self::default()
    }

    /// Fraction of images taken, 0.0..=1.0.
    pub fn progress(&self) -> f32 {
        if self.total_count == 0 {
            0.0
        } else {
            (self.images_taken as f32 / self.total_count as f32).min(1.0)
        }
    }

    /// One-line description for displays and logs.
    pub fn summary(&self) -> String {
        match self.state {
            RunState::Idle => "idle".to_string(),
            RunState::Running => format!(
                "running {} of {}, next in {}s",
                self.images_taken,
                self.total_count,
                self.time_to_next_capture.max(0.0).ceil() as u64
            ),
            RunState::Completed => {
                format!("completed {} of {}", self.images_taken, self.total_count)
            }
            RunState::Cancelled => format!(
                "cancelled after {} of {}",
                self.images_taken, self.total_count
            ),
            RunState::Failed => format!(
                "failed: {}",
                self.last_error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}

impl fmt::Display for TimelapseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_status() {
        let status = TimelapseStatus::idle();
        assert_eq!(status.state, RunState::Idle);
        assert!(!status.running);
        assert_eq!(status.images_taken, 0);
        assert_eq!(status.progress(), 0.0);
        assert_eq!(status.to_string(), "idle");
    }

    #[test]
    fn test_summaries() {
        let mut status = TimelapseStatus {
            run_id: 1,
            state: RunState::Running,
            running: true,
            images_taken: 2,
            total_count: 5,
            interval_secs: 10.0,
            time_to_next_capture: 3.2,
            ..Default::default()
        };
        assert_eq!(status.summary(), "running 2 of 5, next in 4s");
        assert!((status.progress() - 0.4).abs() < f32::EPSILON);

        status.time_to_next_capture = -1.5;
        assert_eq!(status.summary(), "running 2 of 5, next in 0s");

        status.state = RunState::Cancelled;
        assert_eq!(status.summary(), "cancelled after 2 of 5");

        status.state = RunState::Failed;
        status.last_error = Some("camera device error: busy".to_string());
        assert_eq!(status.summary(), "failed: camera device error: busy");
    }

    #[test]
    fn test_state_serializes_snake_case() {
        let json = serde_json::to_string(&RunState::Cancelled).unwrap();
        assert_eq!(json, "\"cancelled\"");
        assert!(RunState::Failed.is_terminal());
        assert!(!RunState::Running.is_terminal());
    }
}

//! State of one run and the loop that drives it.

use crate::camera::{CameraSettings, CaptureDevice};
use crate::timelapse::controller::DeviceLease;
use crate::timelapse::schedule::Schedule;
use crate::timelapse::status::{RunState, TimelapseStatus};
use crate::timelapse::storage::{RunDirectory, RunManifest};
use crate::timelapse::ticker::{Ticker, Wake};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Mutable state of a run. Written only by the run loop.
#[derive(Debug)]
pub(crate) struct TimelapseRun {
    run_id: u64,
    schedule: Schedule,
    directory: RunDirectory,
    start_time: DateTime<Utc>,
    scheduled_finish_time: Option<DateTime<Utc>>,
    images_taken: u32,
    time_to_next_capture: f64,
    time_remaining_total: f64,
    state: RunState,
    last_image: Option<String>,
    last_error: Option<String>,
}

impl TimelapseRun {
    pub(crate) fn new(
        run_id: u64,
        schedule: Schedule,
        directory: RunDirectory,
        start_time: DateTime<Utc>,
    ) -> Self {
        let planned = schedule.planned_duration();
        let scheduled_finish_time = chrono::Duration::from_std(planned)
            .ok()
            .and_then(|planned| start_time.checked_add_signed(planned));

        Self {
            run_id,
            schedule,
            directory,
            start_time,
            scheduled_finish_time,
            images_taken: 0,
            time_to_next_capture: 0.0,
            time_remaining_total: planned.as_secs_f64(),
            state: RunState::Running,
            last_image: None,
            last_error: None,
        }
    }

    pub(crate) fn directory(&self) -> &RunDirectory {
        &self.directory
    }

    pub(crate) fn manifest(&self, camera: CameraSettings, device: String) -> RunManifest {
        RunManifest {
            name: self.directory.name().to_string(),
            total_images: self.schedule.total_count(),
            interval_secs: self.schedule.interval().as_secs_f64(),
            planned_duration_secs: self.schedule.planned_duration().as_secs_f64(),
            start_time: self.start_time,
            device,
            camera,
        }
    }

    pub(crate) fn snapshot(&self) -> TimelapseStatus {
        TimelapseStatus {
            run_id: self.run_id,
            state: self.state,
            running: self.state == RunState::Running,
            images_taken: self.images_taken,
            total_count: self.schedule.total_count(),
            interval_secs: self.schedule.interval().as_secs_f64(),
            time_to_next_capture: self.time_to_next_capture,
            time_remaining_total: self.time_remaining_total,
            destination_name: Some(self.directory.name().to_string()),
            start_time: Some(self.start_time),
            scheduled_finish_time: self.scheduled_finish_time,
            last_image: self.last_image.clone(),
            last_error: self.last_error.clone(),
        }
    }

    fn finish(&mut self, state: RunState) {
        self.state = state;
        self.time_to_next_capture = 0.0;
        if state == RunState::Completed {
            self.time_remaining_total = 0.0;
        }
    }
}

/// Publishes a run's snapshots to its own handle and to the controller.
#[derive(Debug)]
pub(crate) struct StatusPublisher {
    run: watch::Sender<TimelapseStatus>,
    controller: Arc<watch::Sender<TimelapseStatus>>,
}

impl StatusPublisher {
    pub(crate) fn new(
        run: watch::Sender<TimelapseStatus>,
        controller: Arc<watch::Sender<TimelapseStatus>>,
    ) -> Self {
        Self { run, controller }
    }

    pub(crate) fn publish(&self, status: TimelapseStatus) {
        self.run.send_replace(status.clone());
        self.controller.send_replace(status);
    }
}

/// Drive a run to a terminal state and publish the final snapshot.
///
/// The device goes back to the controller before the terminal snapshot is
/// published, so a reader that sees `running == false` can start again.
pub(crate) async fn run_timelapse(
    mut run: TimelapseRun,
    mut lease: DeviceLease,
    mut ticker: Ticker,
    publisher: StatusPublisher,
) -> TimelapseStatus {
    info!(
        "Time-lapse {} started: {} images every {:.2}s into {} (tick {}ms)",
        run.run_id,
        run.schedule.total_count(),
        run.schedule.interval().as_secs_f64(),
        run.directory.path().display(),
        ticker.period().as_millis()
    );

    let state = capture_loop(&mut run, lease.device_mut(), &mut ticker, &publisher).await;

    lease.device_mut().release().await;
    drop(lease);

    run.finish(state);
    let status = run.snapshot();
    publisher.publish(status.clone());

    match state {
        RunState::Completed => info!(
            "Time-lapse {} complete, {} images saved to {}",
            run.run_id,
            run.images_taken,
            run.directory.path().display()
        ),
        RunState::Cancelled => info!(
            "Time-lapse {} cancelled after {} of {} images",
            run.run_id,
            run.images_taken,
            run.schedule.total_count()
        ),
        _ => error!(
            "Time-lapse {} failed after {} images: {}",
            run.run_id,
            run.images_taken,
            run.last_error.as_deref().unwrap_or("unknown error")
        ),
    }

    status
}

async fn capture_loop(
    run: &mut TimelapseRun,
    device: &mut dyn CaptureDevice,
    ticker: &mut Ticker,
    publisher: &StatusPublisher,
) -> RunState {
    loop {
        if ticker.is_cancelled() {
            return RunState::Cancelled;
        }

        let number = run.images_taken + 1;
        let destination = run.directory.image_path(number);
        let acquire_start = Instant::now();

        // not raced against cancellation: a started capture always finishes
        if let Err(e) = device.capture(&destination).await {
            run.last_error = Some(e.to_string());
            return RunState::Failed;
        }

        run.images_taken = number;
        run.last_image = Some(run.directory.image_file_name(number));
        let acquire_time = acquire_start.elapsed();
        debug!(
            "[{}/{}] {} in {:.3}s",
            number,
            run.schedule.total_count(),
            destination.display(),
            acquire_time.as_secs_f64()
        );

        if run.schedule.is_complete(run.images_taken) {
            return RunState::Completed;
        }

        if !run.schedule.interval().is_zero() && acquire_time > run.schedule.interval() {
            warn!(
                "Capture took {:.2}s, longer than the {:.2}s interval",
                acquire_time.as_secs_f64(),
                run.schedule.interval().as_secs_f64()
            );
        }

        loop {
            if ticker.is_cancelled() {
                return RunState::Cancelled;
            }

            let since_start = acquire_start.elapsed();
            run.time_to_next_capture = run.schedule.time_to_next_secs(since_start);
            run.time_remaining_total = run
                .schedule
                .time_remaining_secs(run.time_to_next_capture, run.images_taken);
            publisher.publish(run.snapshot());

            let Some(wait) = run.schedule.remaining_wait(since_start) else {
                break;
            };
            if ticker.wait(wait).await == Wake::Cancelled {
                return RunState::Cancelled;
            }
        }
    }
}

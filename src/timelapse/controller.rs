//! The time-lapse controller: start, stop and status for one camera.

use crate::camera::{CameraSettings, CaptureDevice};
use crate::error::{Result, TimelapseError};
use crate::timelapse::config::{validate_run_name, ControllerOptions, TimelapseConfig};
use crate::timelapse::run::{run_timelapse, StatusPublisher, TimelapseRun};
use crate::timelapse::schedule::Schedule;
use crate::timelapse::status::TimelapseStatus;
use crate::timelapse::storage::RunDirectory;
use crate::timelapse::ticker::CancelToken;
use chrono::{Local, Utc};
use futures_util::stream::{BoxStream, StreamExt};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tracing::{info, warn};

type DeviceSlot = Arc<Mutex<Option<Box<dyn CaptureDevice>>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Exclusive use of the capture device. Dropping the lease puts the device
/// back into the controller's slot.
pub(crate) struct DeviceLease {
    device: Option<Box<dyn CaptureDevice>>,
    slot: DeviceSlot,
}

impl DeviceLease {
    fn acquire(slot: &DeviceSlot) -> Option<Self> {
        let device = lock(slot).take()?;
        Some(Self {
            device: Some(device),
            slot: slot.clone(),
        })
    }

    pub(crate) fn device_mut(&mut self) -> &mut dyn CaptureDevice {
        match self.device.as_deref_mut() {
            Some(device) => device,
            None => unreachable!("a lease holds its device until dropped"),
        }
    }
}

impl Drop for DeviceLease {
    fn drop(&mut self) {
        if let Some(device) = self.device.take() {
            *lock(&self.slot) = Some(device);
        }
    }
}

/// Drives a capture device at a fixed cadence for a fixed number of images.
///
/// At most one run is active at a time. [`start`](Self::start),
/// [`stop`](Self::stop) and [`status`](Self::status) never wait on the
/// camera and may be called from any thread.
pub struct TimelapseController {
    options: ControllerOptions,
    runtime: Handle,
    device: DeviceSlot,
    settings: RwLock<CameraSettings>,
    status: Arc<watch::Sender<TimelapseStatus>>,
    active: Mutex<Option<CancelToken>>,
    next_run_id: AtomicU64,
}

impl TimelapseController {
    /// Create a controller that spawns runs on the current tokio runtime.
    pub fn new(device: impl CaptureDevice, options: ControllerOptions) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| {
            TimelapseError::system_error(format!("a tokio runtime is required: {}", e))
        })?;
        Self::with_runtime(device, options, runtime)
    }

    /// Create a controller that spawns runs on `runtime`.
    pub fn with_runtime(
        device: impl CaptureDevice,
        options: ControllerOptions,
        runtime: Handle,
    ) -> Result<Self> {
        options.validate()?;
        let settings = device.settings().clone();
        info!("Time-lapse controller ready with {}", device.describe());

        let (status, _) = watch::channel(TimelapseStatus::idle());
        Ok(Self {
            options,
            runtime,
            device: Arc::new(Mutex::new(Some(Box::new(device)))),
            settings: RwLock::new(settings),
            status: Arc::new(status),
            active: Mutex::new(None),
            next_run_id: AtomicU64::new(1),
        })
    }

    pub fn options(&self) -> &ControllerOptions {
        &self.options
    }

    /// Start a run and return immediately.
    ///
    /// Creates (or reuses) the output directory and writes the manifest
    /// before the first capture. Fails with
    /// [`TimelapseError::AlreadyRunning`] while another run or a preview
    /// holds the camera, and with [`TimelapseError::Storage`] when the
    /// output directory cannot be created; in both cases nothing is started.
    pub fn start(&self, config: TimelapseConfig) -> Result<RunHandle> {
        config.validate()?;

        let mut slot = lock(&self.device);
        let Some(device) = slot.as_ref() else {
            return Err(TimelapseError::AlreadyRunning);
        };

        let started_at = Local::now();
        let name = match &config.name {
            Some(name) => name.clone(),
            None => self.options.destination_name(&started_at)?,
        };
        validate_run_name(&name)?;
        let directory =
            RunDirectory::prepare(&self.options.output_root, &name, &self.options.image_extension)?;

        let run_id = self.next_run_id.fetch_add(1, Ordering::Relaxed);
        let run = TimelapseRun::new(
            run_id,
            Schedule::from(&config),
            directory,
            started_at.with_timezone(&Utc),
        );

        let manifest = run.manifest(device.settings().clone(), device.describe());
        if let Err(e) = run.directory().write_manifest(&manifest) {
            warn!("Could not write manifest for {}: {}", name, e);
        }

        let lease = DeviceLease {
            device: slot.take(),
            slot: self.device.clone(),
        };
        drop(slot);

        let token = CancelToken::new();
        let ticker = token.ticker(self.options.tick());
        *lock(&self.active) = Some(token.clone());
        let (run_status, status) = watch::channel(run.snapshot());
        let publisher = StatusPublisher::new(run_status, self.status.clone());
        publisher.publish(run.snapshot());

        let task = self
            .runtime
            .spawn(run_timelapse(run, lease, ticker, publisher));

        Ok(RunHandle {
            run_id,
            cancel: token,
            status,
            task,
        })
    }

    /// Ask the active run to stop. Returns without waiting; a no-op when idle.
    pub fn stop(&self) {
        if let Some(token) = lock(&self.active).as_ref() {
            if !token.is_cancelled() && self.is_running() {
                info!("Stop requested for time-lapse {}", self.status.borrow().run_id);
            }
            token.cancel();
        }
    }

    /// Latest published snapshot.
    pub fn status(&self) -> TimelapseStatus {
        self.status.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.status.borrow().running
    }

    /// Receiver that is notified whenever a new snapshot is published.
    pub fn subscribe(&self) -> watch::Receiver<TimelapseStatus> {
        self.status.subscribe()
    }

    /// Stream of snapshots, starting with the current one.
    pub fn status_stream(&self) -> BoxStream<'static, TimelapseStatus> {
        WatchStream::new(self.status.subscribe()).boxed()
    }

    /// Settings that the next run or preview will use.
    pub fn camera_settings(&self) -> CameraSettings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the camera settings. Only allowed while the camera is idle.
    pub fn update_settings(&self, settings: CameraSettings) -> Result<()> {
        settings.validate()?;

        let mut slot = lock(&self.device);
        let device = slot.as_mut().ok_or(TimelapseError::AlreadyRunning)?;
        device.configure(settings.clone())?;
        *self
            .settings
            .write()
            .unwrap_or_else(PoisonError::into_inner) = settings;

        info!("Camera settings updated");
        Ok(())
    }

    /// Take a single image outside of a run.
    pub async fn capture_preview(&self, destination: &Path) -> Result<()> {
        let mut lease = DeviceLease::acquire(&self.device).ok_or(TimelapseError::AlreadyRunning)?;
        lease.device_mut().capture(destination).await?;
        info!("Preview captured to {}", destination.display());
        Ok(())
    }
}

/// Handle to a started run.
///
/// Dropping the handle does not stop the run.
#[derive(Debug)]
pub struct RunHandle {
    run_id: u64,
    cancel: CancelToken,
    status: watch::Receiver<TimelapseStatus>,
    task: JoinHandle<TimelapseStatus>,
}

impl RunHandle {
    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    /// Latest snapshot of this run. Later runs do not change it.
    pub fn status(&self) -> TimelapseStatus {
        self.status.borrow().clone()
    }

    /// Ask this run to stop. Returns without waiting.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Wait for the run to reach a terminal state.
    pub async fn join(self) -> Result<TimelapseStatus> {
        self.task
            .await
            .map_err(|e| TimelapseError::system_error(format!("time-lapse task failed: {}", e)))
    }
}

use super::{Camera, CameraError, CameraKind};
use crate::prelude::*;
use crate::{err, err_ctx, fatal, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};

/// Upper bound for the camera program to enumerate the cameras
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// The line `rpicam-still --list-cameras` prints before listing the cameras.
/// If there are no cameras it prints `No cameras available!` instead.
const CAMERAS_LIST_HEADER: &str = "Available cameras";

/// Raspberry Pi camera module driven by the `rpicam-still` program
pub(crate) struct PiCamera {
    program: PathBuf,
    warm_up: Duration,

    /// Only one driver process may own the camera at a time
    device: tokio::sync::Mutex<()>,
}

/// Exclusive access to the camera. Dropping the session stops the driver
/// and releases the device, no matter at which step the capture stopped.
struct CameraSession<'a> {
    program: &'a Path,
    driver: Option<Child>,
    _device: tokio::sync::MutexGuard<'a, ()>,
}

impl PiCamera {
    pub(crate) fn new(program: PathBuf, warm_up: Duration) -> Self {
        Self {
            program,
            warm_up,
            device: Default::default(),
        }
    }

    async fn open(&self) -> CameraSession<'_> {
        let device = self.device.lock().await;

        CameraSession {
            program: &self.program,
            driver: None,
            _device: device,
        }
    }
}

#[async_trait]
impl Camera for PiCamera {
    fn kind(&self) -> CameraKind {
        CameraKind::Pi
    }

    async fn capture_jpeg(&self) -> Result<Bytes> {
        let mut session = self.open().await;

        session.start_preview()?;

        tokio::time::sleep(self.warm_up).await;

        session.capture().await
    }
}

impl CameraSession<'_> {
    /// Starts the driver in the mode where it shows the preview until it
    /// receives a keypress on stdin. The sensor adjusts the exposure while
    /// the preview is running.
    fn start_preview(&mut self) -> Result {
        let driver = Command::new(self.program)
            .args(["--timeout", "0", "--keypress", "--encoding", "jpg"])
            .args(["--output", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(err_ctx!(CameraError::SpawnDriver {
                program: self.program
            }))?;

        debug!(pid = driver.id(), "Started the camera preview");

        self.driver = Some(driver);

        Ok(())
    }

    async fn capture(&mut self) -> Result<Bytes> {
        let Some(mut driver) = self.driver.take() else {
            return Err(fatal!("The camera preview must be started before the capture"));
        };

        let mut stdin = driver
            .stdin
            .take()
            .fatal_ctx(|| "The camera program stdin must be piped")?;

        // Enter captures a frame, `x` and Enter exits the program
        let request = stdin.write_all(b"\nx\n").await;

        drop(stdin);

        let output = driver
            .wait_with_output()
            .await
            .map_err(err_ctx!(CameraError::ReadFrame))?;

        // If the program has crashed, its exit status says more than the
        // broken pipe error from writing to its stdin
        if !output.status.success() {
            return Err(err!(CameraError::DriverFailed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr),
            }));
        }

        request.map_err(err_ctx!(CameraError::WriteDriverStdin))?;

        if image::guess_format(&output.stdout).ok() != Some(image::ImageFormat::Jpeg) {
            return Err(err!(CameraError::NotJpeg {
                len: output.stdout.len()
            }));
        }

        Ok(output.stdout.into())
    }
}

impl Drop for CameraSession<'_> {
    fn drop(&mut self) {
        let Some(driver) = &mut self.driver else {
            return;
        };

        debug!("Stopping the camera program before the capture has finished");

        if let Err(err) = driver.start_kill() {
            warn!(err = tracing_err(&err), "Failed to stop the camera program");
        }
    }
}

/// Checks that the camera program is installed and sees at least one camera
pub(crate) async fn probe(program: &Path) -> Result {
    let output = Command::new(program)
        .arg("--list-cameras")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output();

    let output = tokio::time::timeout(PROBE_TIMEOUT, output)
        .await
        .map_err(|_| err!(CameraError::ProbeTimedOut { program }))?
        .map_err(err_ctx!(CameraError::SpawnDriver { program }))?;

    // Different versions of the program print the list to different streams
    let listing = [output.stdout, output.stderr]
        .iter()
        .map(|stream| String::from_utf8_lossy(stream))
        .collect::<Vec<_>>()
        .join("\n");

    if !output.status.success() || !listing.contains(CAMERAS_LIST_HEADER) {
        return Err(err!(CameraError::NoCameraDetected {
            program,
            output: listing,
        }));
    }

    debug!(listing = listing.as_str(), "Detected the camera");

    Ok(())
}

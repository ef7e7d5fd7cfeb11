//! Camera capability. It is selected once at startup, either the real
//! Raspberry Pi camera or a placeholder that renders a synthetic image.

mod glyphs;
mod pi;
mod placeholder;

use crate::observability::metrics::{CAPTURE_DURATION_SECONDS, PHOTOS_CAPTURED_TOTAL};
use crate::prelude::*;
use crate::Result;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::prelude::*;
use std::fmt;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub(crate) use pi::PiCamera;
pub(crate) use placeholder::PlaceholderCamera;

/// Time given to the camera sensor to adjust the exposure before the capture
pub(crate) const WARM_UP: Duration = Duration::from_secs(2);

/// `libcamera`-based still capture app that ships with Raspberry Pi OS
pub(crate) const DEFAULT_PROGRAM: &str = "rpicam-still";

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraSelection {
    /// Use the Pi camera if the camera program detects one, otherwise
    /// fall back to the placeholder
    Auto,

    /// Always use the Pi camera
    Pi,

    /// Always use the placeholder image
    Placeholder,
}

pub(crate) struct CameraConfig {
    pub(crate) selection: CameraSelection,
    pub(crate) program: PathBuf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::IntoStaticStr, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum CameraKind {
    Pi,
    Placeholder,
}

#[derive(Debug, Error)]
pub(crate) enum CameraError {
    #[error("Failed to spawn the camera program `{}`", program.display())]
    SpawnDriver {
        program: PathBuf,
        source: std::io::Error,
    },

    #[error("Camera program `{}` didn't list the cameras in time", program.display())]
    ProbeTimedOut { program: PathBuf },

    #[error("Camera program `{}` found no cameras. Output:\n{output}", program.display())]
    NoCameraDetected { program: PathBuf, output: String },

    #[error("Failed to send the capture request to the camera program")]
    WriteDriverStdin { source: std::io::Error },

    #[error("Failed to read the captured frame from the camera program")]
    ReadFrame { source: std::io::Error },

    #[error("Camera program failed with {status}. Stderr:\n{stderr}")]
    DriverFailed { status: ExitStatus, stderr: String },

    #[error("Camera program returned {len} bytes that don't look like a JPEG image")]
    NotJpeg { len: usize },

    #[error("Failed to encode the placeholder image as JPEG")]
    EncodePlaceholder { source: image::ImageError },
}

/// A device that can take a still photo
#[async_trait]
pub(crate) trait Camera: Send + Sync + 'static {
    fn kind(&self) -> CameraKind;

    /// Captures a single JPEG-encoded frame
    async fn capture_jpeg(&self) -> Result<Bytes>;
}

/// JPEG image that lives only while the response with it is being sent
#[derive(Clone)]
pub(crate) struct Photo {
    /// Capture timestamp in the form of `YYYYMMDDTHHMMSSZ.jpg`
    pub(crate) file_name: String,
    pub(crate) jpeg: Bytes,
}

impl fmt::Debug for Photo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Photo")
            .field("file_name", &self.file_name)
            .field("len", &self.jpeg.len())
            .finish()
    }
}

/// Takes a photo with the given camera, and names it after the moment the
/// capture was requested at.
pub(crate) async fn take_photo(camera: &dyn Camera) -> Result<Photo> {
    let file_name = photo_file_name(Utc::now());
    let camera_kind: &'static str = camera.kind().into();

    let (result, duration) = camera.capture_jpeg().with_duration().await;

    let jpeg = result?;

    metrics::increment_counter!(PHOTOS_CAPTURED_TOTAL, "camera" => camera_kind);
    metrics::histogram!(
        CAPTURE_DURATION_SECONDS,
        duration.as_secs_f64(),
        "camera" => camera_kind
    );

    debug!(
        camera = camera_kind,
        duration = tracing_duration(duration),
        len = jpeg.len(),
        file_name = file_name.as_str(),
        "Captured a photo"
    );

    Ok(Photo { file_name, jpeg })
}

fn photo_file_name(timestamp: DateTime<Utc>) -> String {
    format!("{}.jpg", timestamp.to_compact_iso8601())
}

/// Picks the camera to use for the lifetime of the process
pub(crate) async fn detect(config: &CameraConfig) -> Arc<dyn Camera> {
    let pi_camera = || -> Arc<dyn Camera> {
        Arc::new(PiCamera::new(config.program.clone(), WARM_UP))
    };
    let placeholder_camera = || -> Arc<dyn Camera> { Arc::new(PlaceholderCamera::new(WARM_UP)) };

    let camera = match config.selection {
        CameraSelection::Pi => pi_camera(),
        CameraSelection::Placeholder => placeholder_camera(),
        CameraSelection::Auto => match pi::probe(&config.program).await {
            Ok(()) => pi_camera(),
            Err(err) => {
                info!(
                    err = tracing_err(&err),
                    "The camera is not available, falling back to placeholder photos"
                );
                placeholder_camera()
            }
        },
    };

    info!(
        selection = ?config.selection,
        camera = %camera.kind(),
        program = %config.program.display(),
        "Selected the camera"
    );

    camera
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_is_a_compact_utc_timestamp() {
        let timestamp = Utc.with_ymd_and_hms(2021, 12, 31, 23, 59, 58).unwrap();

        assert_eq!(photo_file_name(timestamp), "20211231T235958Z.jpg");
    }

    #[test_log::test(tokio::test)]
    async fn auto_falls_back_to_placeholder() {
        let config = CameraConfig {
            selection: CameraSelection::Auto,
            program: "cambot-test-this-program-does-not-exist".into(),
        };

        assert_eq!(detect(&config).await.kind(), CameraKind::Placeholder);
    }

    #[test_log::test(tokio::test)]
    async fn explicit_selection_skips_probing() {
        let program = PathBuf::from("cambot-test-this-program-does-not-exist");

        let config = CameraConfig {
            selection: CameraSelection::Pi,
            program: program.clone(),
        };
        assert_eq!(detect(&config).await.kind(), CameraKind::Pi);

        let config = CameraConfig {
            selection: CameraSelection::Placeholder,
            program,
        };
        assert_eq!(detect(&config).await.kind(), CameraKind::Placeholder);
    }

    #[test_log::test(tokio::test)]
    async fn take_photo_names_the_frame() {
        let before = Utc::now();
        let photo = take_photo(&PlaceholderCamera::new(Duration::ZERO))
            .await
            .unwrap();

        let stem = photo.file_name.strip_suffix(".jpg").unwrap();
        let taken_at = NaiveDateTime::parse_from_str(stem, "%Y%m%dT%H%M%SZ").unwrap();
        let taken_at = Utc.from_utc_datetime(&taken_at);

        // The file name has a second precision
        assert!(taken_at >= before.with_nanosecond(0).unwrap(), "{taken_at}");
        assert!(taken_at <= Utc::now(), "{taken_at}");
        assert!(!photo.jpeg.is_empty());
    }
}

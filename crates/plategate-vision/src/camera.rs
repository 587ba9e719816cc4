//! Still-frame capture

use std::path::PathBuf;
use std::time::Duration;

use plategate_types::{CameraError, CapturedFrame};

use crate::command::{run_command, CommandError};

/// Single-frame capture device
pub trait Camera {
    fn capture(&mut self) -> Result<CapturedFrame, CameraError>;
}

/// Captures through an external still-capture tool (fswebcam, libcamera-still, ...).
///
/// The output file path is appended as the last argument.
pub struct CommandCamera {
    command: String,
    timeout: Duration,
}

impl CommandCamera {
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            timeout,
        }
    }
}

impl Camera for CommandCamera {
    fn capture(&mut self) -> Result<CapturedFrame, CameraError> {
        let shot = tempfile::Builder::new()
            .prefix("plategate_frame_")
            .suffix(".jpg")
            .tempfile()
            .map_err(|e| CameraError::Unavailable(format!("cannot create frame file: {}", e)))?;

        match run_command(&self.command, [shot.path()], self.timeout) {
            Ok(output) => {
                tracing::debug!(elapsed_ms = output.elapsed.as_millis() as u64, "Frame captured");
            }
            Err(err @ (CommandError::Invalid(_) | CommandError::Spawn { .. } | CommandError::Failed { .. })) => {
                return Err(CameraError::Unavailable(err.to_string()));
            }
            Err(err) => return Err(CameraError::CaptureFailed(err.to_string())),
        }

        let image = image::open(shot.path())
            .map_err(|e| CameraError::CaptureFailed(format!("unreadable frame: {}", e)))?
            .to_rgb8();
        if image.width() == 0 || image.height() == 0 {
            return Err(CameraError::CaptureFailed("empty frame".to_string()));
        }

        Ok(CapturedFrame::new(image))
    }
}

/// Serves the same image file on every capture; for bench runs without a camera
pub struct StillImageCamera {
    path: PathBuf,
}

impl StillImageCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Camera for StillImageCamera {
    fn capture(&mut self) -> Result<CapturedFrame, CameraError> {
        if !self.path.exists() {
            return Err(CameraError::Unavailable(format!(
                "{} not found",
                self.path.display()
            )));
        }
        let image = image::open(&self.path)
            .map_err(|e| CameraError::CaptureFailed(e.to_string()))?
            .to_rgb8();
        Ok(CapturedFrame::new(image))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_still_image_camera() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        RgbImage::from_pixel(8, 6, Rgb([10, 20, 30])).save(&path).unwrap();

        let mut camera = StillImageCamera::new(&path);
        let frame = camera.capture().unwrap();
        assert_eq!((frame.width(), frame.height()), (8, 6));
    }

    #[test]
    fn test_still_image_camera_missing_file() {
        let mut camera = StillImageCamera::new("/nonexistent/frame.png");
        assert!(matches!(camera.capture(), Err(CameraError::Unavailable(_))));
    }

    #[test]
    fn test_missing_capture_tool_is_unavailable() {
        let mut camera = CommandCamera::new("plategate-no-such-camera", Duration::from_secs(1));
        assert!(matches!(camera.capture(), Err(CameraError::Unavailable(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_tool_writing_garbage_is_capture_failure() {
        let mut camera = CommandCamera::new("sh -c 'echo junk > \"$0\"'", Duration::from_secs(5));
        assert!(matches!(camera.capture(), Err(CameraError::CaptureFailed(_))));
    }
}

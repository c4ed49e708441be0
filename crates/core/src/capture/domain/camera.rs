use thiserror::Error;

use crate::shared::constants::{IDEAL_CAPTURE_HEIGHT, IDEAL_CAPTURE_WIDTH};
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("camera {0} is not available")]
    NotFound(u32),
    #[error("camera access denied: {0}")]
    PermissionDenied(String),
    #[error("failed to open camera: {0}")]
    Open(String),
    #[error("failed to read frame: {0}")]
    Read(String),
    #[error("camera is not open")]
    NotOpen,
}

/// Which way the requested camera faces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FacingMode {
    /// Front camera, pointing at the user.
    #[default]
    User,
    Environment,
}

/// Capture preferences. Width and height are ideals, not requirements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoConstraints {
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub facing: FacingMode,
    pub device_index: u32,
}

impl Default for VideoConstraints {
    fn default() -> Self {
        Self {
            ideal_width: IDEAL_CAPTURE_WIDTH,
            ideal_height: IDEAL_CAPTURE_HEIGHT,
            facing: FacingMode::User,
            device_index: 0,
        }
    }
}

/// Live video source.
pub trait Camera: Send {
    /// Starts the stream and returns the resolution actually delivered.
    fn open(&mut self, constraints: &VideoConstraints) -> Result<(u32, u32), CameraError>;

    /// Returns the next frame, or `None` when no frame is ready yet.
    fn read_frame(&mut self) -> Result<Option<Frame>, CameraError>;

    /// Releases the device. Safe to call more than once.
    fn close(&mut self);
}

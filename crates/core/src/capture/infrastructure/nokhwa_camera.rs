//! Physical webcam capture through `nokhwa`.

use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType, Resolution,
};

use crate::capture::domain::camera::{Camera, CameraError, FacingMode, VideoConstraints};
use crate::shared::frame::Frame;

pub struct NokhwaCamera {
    camera: Option<nokhwa::Camera>,
    sequence: u64,
}

// SAFETY: the nokhwa handle is created in `open()` and only ever used by the
// thread that called it. The detection loop moves a closed `NokhwaCamera`
// into its capture thread before opening it.
unsafe impl Send for NokhwaCamera {}

impl NokhwaCamera {
    pub fn new() -> Self {
        Self {
            camera: None,
            sequence: 0,
        }
    }
}

impl Default for NokhwaCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera for NokhwaCamera {
    fn open(&mut self, constraints: &VideoConstraints) -> Result<(u32, u32), CameraError> {
        self.close();

        // Desktop backends expose no facing metadata; the configured device
        // stands in for the user-facing camera.
        if constraints.facing != FacingMode::User {
            log::warn!(
                "facing mode {:?} not supported, using device {}",
                constraints.facing,
                constraints.device_index
            );
        }

        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution);
        let mut camera = nokhwa::Camera::new(CameraIndex::Index(constraints.device_index), requested)
            .map_err(|e| classify_open_error(constraints.device_index, e))?;
        camera
            .open_stream()
            .map_err(|e| classify_open_error(constraints.device_index, e))?;

        if let Err(e) = camera.set_resolution(Resolution::new(
            constraints.ideal_width,
            constraints.ideal_height,
        )) {
            log::warn!(
                "Could not set resolution {}x{}: {e}. Using camera default.",
                constraints.ideal_width,
                constraints.ideal_height
            );
        }

        let resolution = camera.resolution();
        log::info!(
            "Camera {} opened at {}x{}",
            constraints.device_index,
            resolution.width(),
            resolution.height()
        );
        self.camera = Some(camera);
        Ok((resolution.width(), resolution.height()))
    }

    fn read_frame(&mut self) -> Result<Option<Frame>, CameraError> {
        let camera = self.camera.as_mut().ok_or(CameraError::NotOpen)?;
        let buffer = camera
            .frame()
            .map_err(|e| CameraError::Read(e.to_string()))?;
        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| CameraError::Read(e.to_string()))?;

        let (width, height) = (decoded.width(), decoded.height());
        if width == 0 || height == 0 {
            return Ok(None);
        }
        let frame = Frame::new(decoded.into_raw(), width, height, 3, self.sequence);
        self.sequence += 1;
        Ok(Some(frame))
    }

    fn close(&mut self) {
        if let Some(mut camera) = self.camera.take() {
            if let Err(e) = camera.stop_stream() {
                log::warn!("Failed to stop camera stream: {e}");
            }
        }
    }
}

impl Drop for NokhwaCamera {
    fn drop(&mut self) {
        self.close();
    }
}

fn classify_open_error(index: u32, error: nokhwa::NokhwaError) -> CameraError {
    let message = error.to_string();
    let lower = message.to_lowercase();
    if lower.contains("permission") || lower.contains("denied") || lower.contains("not authorized") {
        CameraError::PermissionDenied(message)
    } else if lower.contains("not found") || lower.contains("no device") {
        CameraError::NotFound(index)
    } else {
        CameraError::Open(message)
    }
}

/// Lists capture devices as `(index, human readable name)`.
pub fn list_cameras() -> Result<Vec<(u32, String)>, CameraError> {
    let devices = nokhwa::query(ApiBackend::Auto).map_err(|e| CameraError::Open(e.to_string()))?;
    Ok(devices
        .iter()
        .enumerate()
        .map(|(idx, info)| (idx as u32, info.human_name().to_string()))
        .collect())
}

//! A "camera" that replays one still image at a fixed frame rate.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use crate::capture::domain::camera::{Camera, CameraError, VideoConstraints};
use crate::shared::frame::Frame;

const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(33);

enum StillSource {
    File(PathBuf),
    Frame(Frame),
}

pub struct StillImageCamera {
    source: StillSource,
    frame: Option<Frame>,
    frame_interval: Duration,
    sequence: u64,
}

impl StillImageCamera {
    /// Replays the image at `path`, decoded on `open()`.
    pub fn from_path(path: &Path) -> Self {
        Self::with_source(StillSource::File(path.to_path_buf()))
    }

    /// Replays an already decoded frame.
    pub fn from_frame(frame: Frame) -> Self {
        Self::with_source(StillSource::Frame(frame))
    }

    fn with_source(source: StillSource) -> Self {
        Self {
            source,
            frame: None,
            frame_interval: DEFAULT_FRAME_INTERVAL,
            sequence: 0,
        }
    }

    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }
}

impl Camera for StillImageCamera {
    fn open(&mut self, constraints: &VideoConstraints) -> Result<(u32, u32), CameraError> {
        let frame = match &self.source {
            StillSource::File(path) => {
                let img = image::open(path)
                    .map_err(|e| CameraError::Open(format!("{}: {e}", path.display())))?;
                Frame::from_rgb_image(img.to_rgb8(), 0)
            }
            StillSource::Frame(frame) => frame.clone(),
        };
        if frame.size() != (constraints.ideal_width, constraints.ideal_height) {
            log::debug!(
                "still image is {}x{}, ideal {}x{} ignored",
                frame.width(),
                frame.height(),
                constraints.ideal_width,
                constraints.ideal_height
            );
        }
        let size = frame.size();
        self.frame = Some(frame);
        self.sequence = 0;
        Ok(size)
    }

    fn read_frame(&mut self) -> Result<Option<Frame>, CameraError> {
        let template = self.frame.as_ref().ok_or(CameraError::NotOpen)?;
        if !self.frame_interval.is_zero() {
            thread::sleep(self.frame_interval);
        }
        let frame = Frame::new(
            template.data().to_vec(),
            template.width(),
            template.height(),
            template.channels(),
            self.sequence,
        );
        self.sequence += 1;
        Ok(Some(frame))
    }

    fn close(&mut self) {
        self.frame = None;
    }
}

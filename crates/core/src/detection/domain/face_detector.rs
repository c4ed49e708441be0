use crate::shared::frame::Frame;
use crate::shared::geometry::BoundingBox;

/// A face box reported by the first inference stage, in frame coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceDetection {
    pub bbox: BoundingBox,
    pub score: f64,
}

/// Domain interface for face-box detection.
///
/// Implementations may hold mutable inference state, hence `&mut self`.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceDetection>, Box<dyn std::error::Error>>;
}

use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::shared::frame::Frame;
use crate::shared::geometry::BoundingBox;

/// Second inference stage: 68 facial landmarks for one detected face.
pub trait LandmarkExtractor: Send {
    fn extract(
        &mut self,
        frame: &Frame,
        face: &BoundingBox,
    ) -> Result<FaceLandmarks, Box<dyn std::error::Error>>;
}

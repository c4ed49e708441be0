use crate::detection::domain::age_gender::AgeGenderPrediction;
use crate::shared::frame::Frame;
use crate::shared::geometry::BoundingBox;

/// Final inference stage: estimated age and gender for one detected face.
pub trait AgeGenderEstimator: Send {
    fn estimate(
        &mut self,
        frame: &Frame,
        face: &BoundingBox,
    ) -> Result<AgeGenderPrediction, Box<dyn std::error::Error>>;
}

use crate::detection::domain::expressions::ExpressionScores;
use crate::shared::frame::Frame;
use crate::shared::geometry::BoundingBox;

/// Third inference stage: expression probabilities for one detected face.
pub trait ExpressionClassifier: Send {
    fn classify(
        &mut self,
        frame: &Frame,
        face: &BoundingBox,
    ) -> Result<ExpressionScores, Box<dyn std::error::Error>>;
}

//! Seven-class facial expression classifier.
//!
//! Works with both RGB and single-channel (FER-style) models; the channel
//! count is read from the model input.
use std::path::Path;

use crate::detection::domain::expression_classifier::ExpressionClassifier;
use crate::detection::domain::expressions::ExpressionScores;
use crate::shared::frame::Frame;
use crate::shared::geometry::BoundingBox;

use super::math::softmax;
use super::onnx_session::{input_spec, load_session};
use super::preprocess::{region_to_tensor, InputSpec, Normalization};

const DEFAULT_CROP_SIZE: u32 = 112;

pub struct OnnxExpressionClassifier {
    session: ort::session::Session,
    input: InputSpec,
}

impl OnnxExpressionClassifier {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let session = load_session(model_path)?;
        let input = input_spec(
            &session,
            InputSpec {
                channels: 3,
                width: DEFAULT_CROP_SIZE,
                height: DEFAULT_CROP_SIZE,
            },
        );
        Ok(Self { session, input })
    }
}

impl ExpressionClassifier for OnnxExpressionClassifier {
    fn classify(
        &mut self,
        frame: &Frame,
        face: &BoundingBox,
    ) -> Result<ExpressionScores, Box<dyn std::error::Error>> {
        let tensor = region_to_tensor(frame, face, self.input, Normalization::UnitRange);
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("expression model produced no outputs".into());
        }
        let logits = outputs[0].try_extract_array::<f32>()?;
        let logits = logits.as_slice().ok_or("cannot get expression slice")?;
        scores_from_logits(logits)
    }
}

fn scores_from_logits(logits: &[f32]) -> Result<ExpressionScores, Box<dyn std::error::Error>> {
    // Already a distribution: leave as is.
    let sum: f32 = logits.iter().sum();
    let is_distribution = logits.iter().all(|v| (0.0..=1.0).contains(v)) && (sum - 1.0).abs() < 1e-3;
    let probs = if is_distribution {
        logits.to_vec()
    } else {
        softmax(logits)
    };
    Ok(ExpressionScores::from_slice(&probs)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::expressions::Expression;
    use approx::assert_relative_eq;

    #[test]
    fn test_logits_are_softmaxed() {
        let scores = scores_from_logits(&[0.0, 5.0, 0.0, 0.0, 0.0, 0.0, 0.0]).unwrap();
        assert_eq!(scores.dominant().0, Expression::Happy);
        let total: f64 = scores.iter().map(|(_, p)| p).sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_probabilities_pass_through() {
        let scores = scores_from_logits(&[0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.4]).unwrap();
        assert_relative_eq!(scores.dominant().1, 0.4, epsilon = 1e-6);
    }

    #[test]
    fn test_wrong_class_count_is_error() {
        assert!(scores_from_logits(&[1.0, 2.0, 3.0]).is_err());
    }
}

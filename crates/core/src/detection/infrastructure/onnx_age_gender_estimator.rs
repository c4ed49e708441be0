//! Age regression plus two-class gender head on a face crop.
use std::path::Path;

use crate::detection::domain::age_gender::AgeGenderPrediction;
use crate::detection::domain::age_gender_estimator::AgeGenderEstimator;
use crate::shared::frame::Frame;
use crate::shared::geometry::BoundingBox;

use super::math::softmax;
use super::onnx_session::{input_spec, load_session};
use super::preprocess::{region_to_tensor, InputSpec, Normalization};

const DEFAULT_CROP_SIZE: u32 = 112;

pub struct OnnxAgeGenderEstimator {
    session: ort::session::Session,
    input: InputSpec,
}

impl OnnxAgeGenderEstimator {
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

impl AgeGenderEstimator for OnnxAgeGenderEstimator {
    fn estimate(
        &mut self,
        frame: &Frame,
        face: &BoundingBox,
    ) -> Result<AgeGenderPrediction, Box<dyn std::error::Error>> {
        let tensor = region_to_tensor(frame, face, self.input, Normalization::UnitRange);
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;

        let mut heads = Vec::with_capacity(outputs.len());
        for i in 0..outputs.len() {
            let values = outputs[i].try_extract_array::<f32>()?;
            heads.push(values.iter().copied().collect::<Vec<f32>>());
        }
        decode_heads(&heads)
    }
}

/// Picks the age (1 value) and gender (2 logits, male first) heads out of
/// the model outputs, whatever order they come in.
fn decode_heads(heads: &[Vec<f32>]) -> Result<AgeGenderPrediction, Box<dyn std::error::Error>> {
    let age = heads
        .iter()
        .find(|h| h.len() == 1)
        .map(|h| h[0] as f64)
        .ok_or("age/gender model has no age output")?;
    let gender = heads
        .iter()
        .find(|h| h.len() == 2)
        .ok_or("age/gender model has no gender output")?;
    let probs = softmax(gender);
    Ok(AgeGenderPrediction::from_probabilities(
        age,
        probs[0] as f64,
        probs[1] as f64,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::age_gender::Gender;
    use approx::assert_relative_eq;

    #[test]
    fn test_decode_heads_in_any_order() {
        let p = decode_heads(&[vec![-1.0, 2.0], vec![27.4]]).unwrap();
        assert_relative_eq!(p.age, 27.4, epsilon = 1e-4);
        assert_eq!(p.gender, Gender::Female);
        assert!(p.gender_probability > 0.9);
    }

    #[test]
    fn test_decode_heads_missing_gender() {
        assert!(decode_heads(&[vec![30.0]]).is_err());
    }

    #[test]
    fn test_decode_heads_missing_age() {
        assert!(decode_heads(&[vec![0.5, 0.5]]).is_err());
    }
}

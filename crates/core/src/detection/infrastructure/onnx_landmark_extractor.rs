//! 68-point landmark regressor on a square face crop.
use std::path::Path;

use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::detection::domain::landmark_extractor::LandmarkExtractor;
use crate::shared::frame::Frame;
use crate::shared::geometry::BoundingBox;

use super::onnx_session::{input_spec, load_session};
use super::preprocess::{region_to_tensor, InputSpec, Normalization};

const DEFAULT_CROP_SIZE: u32 = 112;

pub struct OnnxLandmarkExtractor {
    session: ort::session::Session,
    input: InputSpec,
}

impl OnnxLandmarkExtractor {
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

impl LandmarkExtractor for OnnxLandmarkExtractor {
    fn extract(
        &mut self,
        frame: &Frame,
        face: &BoundingBox,
    ) -> Result<FaceLandmarks, Box<dyn std::error::Error>> {
        let tensor = region_to_tensor(frame, face, self.input, Normalization::UnitRange);
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("landmark model produced no outputs".into());
        }
        let values = outputs[0].try_extract_array::<f32>()?;
        let values = values.as_slice().ok_or("cannot get landmark slice")?;
        Ok(FaceLandmarks::from_relative(values, face)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_fails_to_load() {
        assert!(OnnxLandmarkExtractor::new(Path::new("/nonexistent/landmarks.onnx")).is_err());
    }
}

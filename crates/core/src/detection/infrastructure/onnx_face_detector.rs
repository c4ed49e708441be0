//! Lightweight single-shot face detector using ONNX Runtime via `ort`.
//!
//! Expects an UltraFace-style model: a `[1, N, 2]` background/face score
//! tensor and a `[1, N, 4]` tensor of normalized `x1, y1, x2, y2` boxes.
use std::path::Path;

use crate::detection::domain::face_detector::{FaceDetection, FaceDetector};
use crate::shared::constants::{DETECTOR_INPUT_SIZE, MIN_CONFIDENCE};
use crate::shared::frame::Frame;
use crate::shared::geometry::BoundingBox;

use super::math::nms;
use super::onnx_session::{input_spec, load_session};
use super::preprocess::{frame_to_tensor, InputSpec, Normalization};

/// Candidates below the lowest slider setting never reach NMS; the current
/// slider value filters the rest downstream.
const SCORE_FLOOR: f64 = MIN_CONFIDENCE as f64;

const NMS_IOU_THRESH: f64 = 0.45;

pub struct OnnxFaceDetector {
    session: ort::session::Session,
    input: InputSpec,
}

impl OnnxFaceDetector {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let session = load_session(model_path)?;
        let input = input_spec(
            &session,
            InputSpec {
                channels: 3,
                width: DETECTOR_INPUT_SIZE,
                height: DETECTOR_INPUT_SIZE,
            },
        );
        Ok(Self { session, input })
    }
}

impl FaceDetector for OnnxFaceDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceDetection>, Box<dyn std::error::Error>> {
        let tensor = frame_to_tensor(frame, self.input, Normalization::Centered);
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() < 2 {
            return Err("face detector must produce score and box outputs".into());
        }

        let first = outputs[0].try_extract_array::<f32>()?;
        let second = outputs[1].try_extract_array::<f32>()?;
        // Output order varies between exports; the box tensor is the one
        // whose last dimension is 4.
        let (scores, boxes) = if first.shape().last() == Some(&4) {
            (second, first)
        } else {
            (first, second)
        };

        let scores = scores.as_slice().ok_or("cannot get score slice")?;
        let boxes = boxes.as_slice().ok_or("cannot get box slice")?;
        let mut dets = decode_detections(
            scores,
            boxes,
            frame.width(),
            frame.height(),
            SCORE_FLOOR,
        )?;
        Ok(nms(&mut dets, NMS_IOU_THRESH))
    }
}

/// Turns raw model output into frame-space detections above `threshold`.
fn decode_detections(
    scores: &[f32],
    boxes: &[f32],
    frame_width: u32,
    frame_height: u32,
    threshold: f64,
) -> Result<Vec<FaceDetection>, Box<dyn std::error::Error>> {
    if scores.len() % 2 != 0 || boxes.len() % 4 != 0 || scores.len() / 2 != boxes.len() / 4 {
        return Err(format!(
            "mismatched detector outputs: {} scores, {} box values",
            scores.len(),
            boxes.len()
        )
        .into());
    }

    let fw = frame_width as f64;
    let fh = frame_height as f64;
    let dets = scores
        .chunks_exact(2)
        .zip(boxes.chunks_exact(4))
        .filter_map(|(score, b)| {
            let face = score[1] as f64;
            if face < threshold {
                return None;
            }
            let bbox = BoundingBox::from_corners(
                b[0] as f64 * fw,
                b[1] as f64 * fh,
                b[2] as f64 * fw,
                b[3] as f64 * fh,
            );
            (!bbox.is_empty()).then_some(FaceDetection { bbox, score: face })
        })
        .collect();
    Ok(dets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::inference_pipeline::test_support::stub_pipeline;
    use approx::assert_relative_eq;

    #[test]
    fn test_decode_scales_normalized_boxes() {
        let scores = [0.1, 0.9];
        let boxes = [0.25, 0.5, 0.75, 1.0];
        let dets = decode_detections(&scores, &boxes, 400, 200, 0.5).unwrap();

        assert_eq!(dets.len(), 1);
        assert_relative_eq!(dets[0].bbox.x, 100.0, epsilon = 1e-4);
        assert_relative_eq!(dets[0].bbox.y, 100.0, epsilon = 1e-4);
        assert_relative_eq!(dets[0].bbox.width, 200.0, epsilon = 1e-4);
        assert_relative_eq!(dets[0].bbox.height, 100.0, epsilon = 1e-4);
        assert_relative_eq!(dets[0].score, 0.9, epsilon = 1e-6);
    }

    #[test]
    fn test_decode_drops_low_scores_and_degenerate_boxes() {
        let scores = [0.7, 0.3, 0.1, 0.9];
        let boxes = [0.0, 0.0, 0.5, 0.5, 0.5, 0.5, 0.5, 0.8];
        let dets = decode_detections(&scores, &boxes, 100, 100, 0.5).unwrap();
        assert!(dets.is_empty());
    }

    #[test]
    fn test_decode_keeps_faces_down_to_lowest_slider_setting() {
        let scores = [0.7, 0.3, 0.95, 0.05];
        let boxes = [0.1, 0.1, 0.4, 0.4, 0.5, 0.5, 0.9, 0.9];
        let dets = decode_detections(&scores, &boxes, 100, 100, SCORE_FLOOR).unwrap();
        assert_eq!(dets.len(), 1);
        assert_relative_eq!(dets[0].score, 0.3, epsilon = 1e-6);
    }

    #[test]
    fn test_slider_decides_which_decoded_faces_survive() {
        let scores = [0.7, 0.3];
        let boxes = [0.1, 0.1, 0.6, 0.6];
        let dets = decode_detections(&scores, &boxes, 100, 100, SCORE_FLOOR).unwrap();
        let frame = Frame::new(vec![0u8; 100 * 100 * 3], 100, 100, 3, 0);

        let mut pipeline = stub_pipeline(dets, 0.1);
        assert_eq!(pipeline.analyze(&frame).unwrap().len(), 1);

        pipeline.confidence().set(0.5);
        assert!(pipeline.analyze(&frame).unwrap().is_empty());
    }

    #[test]
    fn test_decode_rejects_mismatched_outputs() {
        assert!(decode_detections(&[0.1, 0.9], &[0.0; 8], 100, 100, 0.5).is_err());
    }

    #[test]
    fn test_missing_model_fails_to_load() {
        let result = OnnxFaceDetector::new(Path::new("/nonexistent/detector.onnx"));
        assert!(result.is_err());
    }
}

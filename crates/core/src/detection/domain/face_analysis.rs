use crate::detection::domain::age_gender::{AgeGenderPrediction, Gender};
use crate::detection::domain::expressions::ExpressionScores;
use crate::detection::domain::face_detector::FaceDetection;
use crate::detection::domain::face_landmarks::FaceLandmarks;

/// Everything the inference pipeline knows about one face in one frame.
///
/// There is no identity across frames: each tick produces a fresh list.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceAnalysis {
    pub detection: FaceDetection,
    pub landmarks: FaceLandmarks,
    pub expressions: ExpressionScores,
    pub age: f64,
    pub gender: Gender,
    pub gender_probability: f64,
}

impl FaceAnalysis {
    pub fn new(
        detection: FaceDetection,
        landmarks: FaceLandmarks,
        expressions: ExpressionScores,
        age_gender: AgeGenderPrediction,
    ) -> Self {
        Self {
            detection,
            landmarks,
            expressions,
            age: age_gender.age,
            gender: age_gender.gender,
            gender_probability: age_gender.gender_probability,
        }
    }

    pub fn rounded_age(&self) -> u32 {
        self.age.round().max(0.0) as u32
    }

    pub fn confidence_percent(&self) -> u32 {
        (self.gender_probability * 100.0).round().clamp(0.0, 100.0) as u32
    }

    /// Overlay text drawn next to the face box.
    pub fn label(&self) -> String {
        format!(
            "Age: {} | Gender: {} | Confidence: {}%",
            self.rounded_age(),
            self.gender,
            self.confidence_percent()
        )
    }

    pub fn scale(&self, sx: f64, sy: f64) -> Self {
        Self {
            detection: FaceDetection {
                bbox: self.detection.bbox.scale(sx, sy),
                score: self.detection.score,
            },
            landmarks: self.landmarks.scale(sx, sy),
            ..self.clone()
        }
    }
}

/// Rescales boxes and landmarks from `from` (the frame the models saw) to
/// `to` (the surface they are drawn on).
///
/// Returns an empty list when either size has a zero side.
pub fn resize_results(
    results: &[FaceAnalysis],
    from: (u32, u32),
    to: (u32, u32),
) -> Vec<FaceAnalysis> {
    if from.0 == 0 || from.1 == 0 || to.0 == 0 || to.1 == 0 {
        return Vec::new();
    }
    if from == to {
        return results.to_vec();
    }
    let sx = to.0 as f64 / from.0 as f64;
    let sy = to.1 as f64 / from.1 as f64;
    results.iter().map(|r| r.scale(sx, sy)).collect()
}


#[cfg(test)]
mod tests {
    use super::test_support::analysis;
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_label_format() {
        let face = analysis(0.0, 0.0, 100.0, 31.6, 0.873);
        assert_eq!(face.label(), "Age: 32 | Gender: female | Confidence: 87%");
    }

    #[test]
    fn test_label_male() {
        let face = analysis(0.0, 0.0, 100.0, 24.2, 0.05);
        assert_eq!(face.label(), "Age: 24 | Gender: male | Confidence: 95%");
    }

    #[test]
    fn test_resize_scales_boxes_and_landmarks() {
        let faces = vec![analysis(10.0, 20.0, 100.0, 30.0, 0.9)];
        let resized = resize_results(&faces, (640, 360), (1280, 720));

        let bbox = resized[0].detection.bbox;
        assert_relative_eq!(bbox.x, 20.0);
        assert_relative_eq!(bbox.y, 40.0);
        assert_relative_eq!(bbox.width, 200.0);
        let (lx, ly) = resized[0].landmarks.points()[0];
        assert_relative_eq!(lx, 20.0);
        assert_relative_eq!(ly, 140.0);
        assert_eq!(resized[0].label(), faces[0].label());
    }

    #[test]
    fn test_resize_identity_when_sizes_match() {
        let faces = vec![analysis(10.0, 20.0, 100.0, 30.0, 0.9)];
        assert_eq!(resize_results(&faces, (640, 480), (640, 480)), faces);
    }

    #[rstest]
    #[case((0, 480), (640, 480))]
    #[case((640, 480), (640, 0))]
    fn test_resize_zero_size_yields_empty(#[case] from: (u32, u32), #[case] to: (u32, u32)) {
        let faces = vec![analysis(10.0, 20.0, 100.0, 30.0, 0.9)];
        assert!(resize_results(&faces, from, to).is_empty());
    }
}

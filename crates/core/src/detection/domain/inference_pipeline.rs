use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::detection::domain::age_gender_estimator::AgeGenderEstimator;
use crate::detection::domain::expression_classifier::ExpressionClassifier;
use crate::detection::domain::face_analysis::FaceAnalysis;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::landmark_extractor::LandmarkExtractor;
use crate::shared::frame::Frame;

/// Shared, lock-free confidence threshold.
///
/// The UI thread writes it from the settings slider while the inference
/// worker reads it once per frame.
#[derive(Clone, Debug)]
pub struct ConfidenceThreshold(Arc<AtomicU32>);

impl ConfidenceThreshold {
    pub fn new(value: f32) -> Self {
        Self(Arc::new(AtomicU32::new(value.to_bits())))
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub fn set(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// Face boxes → landmarks → expressions → age/gender, per frame.
pub struct InferencePipeline {
    detector: Box<dyn FaceDetector>,
    landmark_extractor: Box<dyn LandmarkExtractor>,
    expression_classifier: Box<dyn ExpressionClassifier>,
    age_gender_estimator: Box<dyn AgeGenderEstimator>,
    confidence: ConfidenceThreshold,
}

impl InferencePipeline {
    pub fn new(
        detector: Box<dyn FaceDetector>,
        landmark_extractor: Box<dyn LandmarkExtractor>,
        expression_classifier: Box<dyn ExpressionClassifier>,
        age_gender_estimator: Box<dyn AgeGenderEstimator>,
        confidence: ConfidenceThreshold,
    ) -> Self {
        Self {
            detector,
            landmark_extractor,
            expression_classifier,
            age_gender_estimator,
            confidence,
        }
    }

    pub fn confidence(&self) -> &ConfidenceThreshold {
        &self.confidence
    }

    /// Runs every stage on every face whose detection score reaches the
    /// current confidence threshold. Any stage error fails the whole frame.
    pub fn analyze(
        &mut self,
        frame: &Frame,
    ) -> Result<Vec<FaceAnalysis>, Box<dyn std::error::Error>> {
        let min_score = self.confidence.get() as f64;
        let detections = self.detector.detect(frame)?;

        let mut results = Vec::with_capacity(detections.len());
        for detection in detections {
            if detection.score < min_score {
                continue;
            }
            let face = detection.bbox.clamp_to(frame.width(), frame.height());
            if face.is_empty() {
                continue;
            }
            let landmarks = self.landmark_extractor.extract(frame, &face)?;
            let expressions = self.expression_classifier.classify(frame, &face)?;
            let age_gender = self.age_gender_estimator.estimate(frame, &face)?;
            results.push(FaceAnalysis::new(
                detection,
                landmarks,
                expressions,
                age_gender,
            ));
        }
        Ok(results)
    }
}

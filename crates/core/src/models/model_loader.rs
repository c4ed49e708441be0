//! One-shot, all-or-nothing loading of the four model bundles.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::thread;

use thiserror::Error;

use crate::detection::domain::age_gender_estimator::AgeGenderEstimator;
use crate::detection::domain::expression_classifier::ExpressionClassifier;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::inference_pipeline::{ConfidenceThreshold, InferencePipeline};
use crate::detection::domain::landmark_extractor::LandmarkExtractor;
use crate::detection::infrastructure::onnx_age_gender_estimator::OnnxAgeGenderEstimator;
use crate::detection::infrastructure::onnx_expression_classifier::OnnxExpressionClassifier;
use crate::detection::infrastructure::onnx_face_detector::OnnxFaceDetector;
use crate::detection::infrastructure::onnx_landmark_extractor::OnnxLandmarkExtractor;
use crate::shared::constants::{
    AGE_GENDER_MODEL_NAME, FACE_DETECTOR_MODEL_NAME, FACE_EXPRESSION_MODEL_NAME,
    FACE_LANDMARK_MODEL_NAME,
};
use crate::shared::model_resolver::{self, ModelResolveError, ModelSource};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModelBundle {
    TinyFaceDetector,
    FaceLandmark68,
    FaceExpression,
    AgeGender,
}

impl ModelBundle {
    pub const ALL: [ModelBundle; 4] = [
        ModelBundle::TinyFaceDetector,
        ModelBundle::FaceLandmark68,
        ModelBundle::FaceExpression,
        ModelBundle::AgeGender,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            ModelBundle::TinyFaceDetector => FACE_DETECTOR_MODEL_NAME,
            ModelBundle::FaceLandmark68 => FACE_LANDMARK_MODEL_NAME,
            ModelBundle::FaceExpression => FACE_EXPRESSION_MODEL_NAME,
            ModelBundle::AgeGender => AGE_GENDER_MODEL_NAME,
        }
    }
}

impl fmt::Display for ModelBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelBundle::TinyFaceDetector => "face detector",
            ModelBundle::FaceLandmark68 => "face landmark",
            ModelBundle::FaceExpression => "face expression",
            ModelBundle::AgeGender => "age/gender",
        };
        write!(f, "{name}")
    }
}

#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("{bundle} model unavailable: {source}")]
    Resolve {
        bundle: ModelBundle,
        #[source]
        source: ModelResolveError,
    },
    #[error("{bundle} model failed to initialize: {message}")]
    Init { bundle: ModelBundle, message: String },
}

impl ModelLoadError {
    /// The bundle that failed.
    pub fn bundle(&self) -> ModelBundle {
        match self {
            ModelLoadError::Resolve { bundle, .. } | ModelLoadError::Init { bundle, .. } => *bundle,
        }
    }
}

/// Download progress: `(bundle, bytes_downloaded, total_bytes)`.
pub type LoadProgressFn = Arc<dyn Fn(ModelBundle, u64, u64) + Send + Sync>;

/// Settings the loaded pipeline starts with.
#[derive(Clone)]
pub struct LoadOptions {
    pub source: ModelSource,
    pub confidence: ConfidenceThreshold,
}

/// Loads all four bundles concurrently and assembles the pipeline.
///
/// Fails with the first bundle (in `ModelBundle::ALL` order) that could not
/// be resolved or initialized. Nothing is retried.
pub fn load_models(
    options: &LoadOptions,
    progress: Option<LoadProgressFn>,
) -> Result<InferencePipeline, ModelLoadError> {
    log::info!("Loading models from {}", options.source);

    let (detector, landmarks, expressions, age_gender) = thread::scope(|s| {
        let detector = s.spawn(|| {
            load_bundle(ModelBundle::TinyFaceDetector, options, &progress, |path| {
                OnnxFaceDetector::new(path)
                    .map(|d| Box::new(d) as Box<dyn FaceDetector>)
            })
        });
        let landmarks = s.spawn(|| {
            load_bundle(ModelBundle::FaceLandmark68, options, &progress, |path| {
                OnnxLandmarkExtractor::new(path).map(|m| Box::new(m) as Box<dyn LandmarkExtractor>)
            })
        });
        let expressions = s.spawn(|| {
            load_bundle(ModelBundle::FaceExpression, options, &progress, |path| {
                OnnxExpressionClassifier::new(path)
                    .map(|m| Box::new(m) as Box<dyn ExpressionClassifier>)
            })
        });
        let age_gender = s.spawn(|| {
            load_bundle(ModelBundle::AgeGender, options, &progress, |path| {
                OnnxAgeGenderEstimator::new(path)
                    .map(|m| Box::new(m) as Box<dyn AgeGenderEstimator>)
            })
        });

        (
            join_bundle(ModelBundle::TinyFaceDetector, detector.join()),
            join_bundle(ModelBundle::FaceLandmark68, landmarks.join()),
            join_bundle(ModelBundle::FaceExpression, expressions.join()),
            join_bundle(ModelBundle::AgeGender, age_gender.join()),
        )
    });

    let pipeline = InferencePipeline::new(
        detector?,
        landmarks?,
        expressions?,
        age_gender?,
        options.confidence.clone(),
    );
    log::info!("All models loaded");
    Ok(pipeline)
}

fn load_bundle<T>(
    bundle: ModelBundle,
    options: &LoadOptions,
    progress: &Option<LoadProgressFn>,
    init: impl FnOnce(&Path) -> Result<T, Box<dyn std::error::Error>>,
) -> Result<T, ModelLoadError> {
    let on_progress = progress.clone().map(|cb| {
        Box::new(move |done: u64, total: u64| cb(bundle, done, total))
            as model_resolver::ProgressFn
    });
    let path = model_resolver::resolve(bundle.file_name(), &options.source, on_progress)
        .map_err(|source| ModelLoadError::Resolve { bundle, source })?;
    log::info!("Resolved {bundle} model: {}", path.display());

    init(&path).map_err(|e| ModelLoadError::Init {
        bundle,
        message: e.to_string(),
    })
}

fn join_bundle<T>(
    bundle: ModelBundle,
    joined: thread::Result<Result<T, ModelLoadError>>,
) -> Result<T, ModelLoadError> {
    joined.unwrap_or_else(|_| {
        Err(ModelLoadError::Init {
            bundle,
            message: "loader thread panicked".into(),
        })
    })
}

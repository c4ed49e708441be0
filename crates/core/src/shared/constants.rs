use std::time::Duration;

pub const FACE_DETECTOR_MODEL_NAME: &str = "tiny_face_detector.onnx";
pub const FACE_LANDMARK_MODEL_NAME: &str = "face_landmark_68.onnx";
pub const FACE_EXPRESSION_MODEL_NAME: &str = "face_expression.onnx";
pub const AGE_GENDER_MODEL_NAME: &str = "age_gender.onnx";

/// Base location the model bundles are loaded from when nothing is configured.
pub const DEFAULT_MODEL_DIR: &str = "models";

/// Fixed period of the detection loop.
pub const DETECTION_INTERVAL: Duration = Duration::from_millis(100);

pub const IDEAL_CAPTURE_WIDTH: u32 = 1280;
pub const IDEAL_CAPTURE_HEIGHT: u32 = 720;

/// Square input used by the face detector when the model leaves it dynamic.
pub const DETECTOR_INPUT_SIZE: u32 = 224;

pub const SNAPSHOT_FILENAME: &str = "face-detection.jpg";
pub const SNAPSHOT_JPEG_QUALITY: u8 = 92;

pub const DEFAULT_CONFIDENCE: f32 = 0.5;
pub const MIN_CONFIDENCE: f32 = 0.1;
pub const MAX_CONFIDENCE: f32 = 0.9;
pub const CONFIDENCE_STEP: f32 = 0.1;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

pub mod math;
pub mod onnx_age_gender_estimator;
pub mod onnx_expression_classifier;
pub mod onnx_face_detector;
pub mod onnx_landmark_extractor;
pub mod onnx_session;
pub mod preprocess;

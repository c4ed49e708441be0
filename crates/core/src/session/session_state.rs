//! UI-independent application state.
//!
//! Front-ends feed user actions and loop events in and act on the returned
//! `CameraCommand`s; the session never touches threads or devices itself.

use crate::detection::domain::face_analysis::FaceAnalysis;
use crate::export::domain::snapshot_encoder::{Snapshot, SnapshotEncoder};
use crate::pipeline::detection_loop::DetectionBatch;
use crate::session::app_mode::AppMode;
use crate::shared::constants::{CONFIDENCE_STEP, DEFAULT_CONFIDENCE, MAX_CONFIDENCE, MIN_CONFIDENCE};
use crate::shared::frame::Frame;

/// Message shown when model loading fails.
pub const MODEL_LOAD_FAILED: &str = "Failed to load AI models. Please restart the application.";

/// What the front-end must do with the detection loop after an action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraCommand {
    /// Start a loop tagged with this generation.
    Start(u64),
    /// Stop the running loop.
    Stop,
    None,
}

#[derive(Debug, Clone)]
pub struct Session {
    mode: AppMode,
    detections: Option<DetectionBatch>,
    snapshot: Option<Snapshot>,
    error: Option<String>,
    processing: bool,
    settings_open: bool,
    confidence: f32,
    generation: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            mode: AppMode::Idle,
            detections: None,
            snapshot: None,
            error: None,
            processing: false,
            settings_open: false,
            confidence: DEFAULT_CONFIDENCE,
            generation: 0,
        }
    }

    pub fn mode(&self) -> AppMode {
        self.mode
    }

    pub fn detections(&self) -> &[FaceAnalysis] {
        self.detections
            .as_ref()
            .map(|b| b.results.as_slice())
            .unwrap_or(&[])
    }

    pub fn current_batch(&self) -> Option<&DetectionBatch> {
        self.detections.as_ref()
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub fn settings_open(&self) -> bool {
        self.settings_open
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    // --- model lifecycle ---

    pub fn begin_loading(&mut self) -> bool {
        if self.mode != AppMode::Idle {
            return false;
        }
        self.mode = AppMode::Loading;
        true
    }

    pub fn models_loaded(&mut self) -> bool {
        if self.mode != AppMode::Loading {
            return false;
        }
        self.mode = AppMode::ReadyCameraOff;
        self.error = None;
        true
    }

    /// Enters the terminal `Error` state. `detail` is logged; the user sees
    /// `MODEL_LOAD_FAILED`.
    pub fn models_failed(&mut self, detail: &str) -> bool {
        if self.mode != AppMode::Loading {
            return false;
        }
        log::error!("Error loading models: {detail}");
        self.mode = AppMode::Error;
        self.error = Some(MODEL_LOAD_FAILED.to_string());
        true
    }

    // --- camera ---

    /// Flips the camera. Only possible once models are ready.
    pub fn toggle_camera(&mut self) -> CameraCommand {
        let command = match self.mode {
            AppMode::ReadyCameraOff => {
                self.mode = AppMode::ReadyCameraOn;
                self.generation += 1;
                CameraCommand::Start(self.generation)
            }
            AppMode::ReadyCameraOn => {
                self.mode = AppMode::ReadyCameraOff;
                self.generation += 1;
                CameraCommand::Stop
            }
            AppMode::Idle | AppMode::Loading | AppMode::Error => return CameraCommand::None,
        };
        self.clear_results();
        self.error = None;
        command
    }

    /// Camera off, nothing shown. Stops the loop if it was running.
    ///
    /// Only acts in the ready states. `Error` is terminal and keeps its
    /// message, and `Idle`/`Loading` have nothing to clear.
    pub fn reset(&mut self) -> CameraCommand {
        if !self.mode.is_ready() {
            return CameraCommand::None;
        }
        let command = if self.mode.camera_on() {
            self.generation += 1;
            CameraCommand::Stop
        } else {
            CameraCommand::None
        };
        self.mode = AppMode::ReadyCameraOff;
        self.clear_results();
        self.error = None;
        command
    }

    /// The loop for `generation` lost its camera. Returns `false` for a
    /// stale generation.
    pub fn camera_failed(&mut self, generation: u64, message: &str) -> bool {
        if generation != self.generation || !self.mode.camera_on() {
            return false;
        }
        self.mode = AppMode::ReadyCameraOff;
        self.generation += 1;
        self.clear_results();
        self.error = Some(message.to_string());
        true
    }

    // --- snapshot ---

    /// Encodes `frame` as the current snapshot. No-op without an active
    /// camera or a ready frame.
    pub fn capture(&mut self, frame: Option<&Frame>, encoder: &dyn SnapshotEncoder) -> bool {
        if !self.mode.camera_on() {
            return false;
        }
        let Some(frame) = frame else {
            return false;
        };
        match encoder.encode(frame) {
            Ok(snapshot) => {
                self.snapshot = Some(snapshot);
                true
            }
            Err(e) => {
                log::warn!("Snapshot failed: {e}");
                false
            }
        }
    }

    // --- loop events ---

    /// Shows `batch` if it belongs to the running loop and is newer than
    /// the one displayed.
    pub fn apply_detections(&mut self, batch: DetectionBatch) -> bool {
        if !self.mode.camera_on() || batch.generation != self.generation {
            return false;
        }
        if let Some(current) = &self.detections {
            if current.generation == batch.generation && batch.seq <= current.seq {
                return false;
            }
        }
        self.detections = Some(batch);
        true
    }

    pub fn set_processing(&mut self, processing: bool) {
        self.processing = processing && self.mode.camera_on();
    }

    // --- settings ---

    /// Clamps to 10%..=90% and snaps to 10% steps. Returns the stored value.
    pub fn set_confidence(&mut self, value: f32) -> f32 {
        if value.is_finite() {
            let min_step = (MIN_CONFIDENCE / CONFIDENCE_STEP).round();
            let max_step = (MAX_CONFIDENCE / CONFIDENCE_STEP).round();
            let steps = (value / CONFIDENCE_STEP).round().clamp(min_step, max_step);
            self.confidence = steps / (1.0 / CONFIDENCE_STEP).round();
        }
        self.confidence
    }

    /// Only available while the camera is on. Returns the new visibility.
    pub fn toggle_settings(&mut self) -> bool {
        if self.mode.camera_on() {
            self.settings_open = !self.settings_open;
        }
        self.settings_open
    }

    fn clear_results(&mut self) {
        self.detections = None;
        self.snapshot = None;
        self.processing = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face_analysis::test_support::analysis;
    use rstest::rstest;

    struct StubEncoder {
        fail: bool,
    }

    impl SnapshotEncoder for StubEncoder {
        fn encode(&self, frame: &Frame) -> Result<Snapshot, Box<dyn std::error::Error>> {
            if self.fail {
                return Err("encoder failed".into());
            }
            Ok(Snapshot {
                bytes: vec![1, 2, 3],
                width: frame.width(),
                height: frame.height(),
                extension: self.extension(),
            })
        }

        fn extension(&self) -> &'static str {
            "bin"
        }
    }

    const ENCODER: StubEncoder = StubEncoder { fail: false };

    fn frame() -> Frame {
        Frame::new(vec![0u8; 4 * 4 * 3], 4, 4, 3, 0)
    }

    fn batch(generation: u64, seq: u64) -> DetectionBatch {
        DetectionBatch {
            generation,
            seq,
            frame_size: (640, 480),
            results: vec![analysis(10.0, 10.0, 50.0, 30.0, 0.9)],
        }
    }

    fn ready() -> Session {
        let mut session = Session::new();
        session.begin_loading();
        session.models_loaded();
        session
    }

    /// Camera on, with detections, snapshot and an error all present.
    fn busy() -> Session {
        let mut session = ready();
        assert_eq!(session.toggle_camera(), CameraCommand::Start(1));
        assert!(session.apply_detections(batch(1, 1)));
        assert!(session.capture(Some(&frame()), &ENCODER));
        session.error = Some("camera hiccup".into());
        session
    }

    fn assert_cleared(session: &Session) {
        assert!(session.detections().is_empty());
        assert!(session.snapshot().is_none());
        assert!(session.error().is_none());
    }

    #[test]
    fn test_loading_lifecycle() {
        let mut session = Session::new();
        assert_eq!(session.mode(), AppMode::Idle);
        assert!(session.begin_loading());
        assert!(!session.begin_loading());
        assert_eq!(session.mode(), AppMode::Loading);
        assert!(session.models_loaded());
        assert_eq!(session.mode(), AppMode::ReadyCameraOff);
    }

    #[test]
    fn test_toggle_on_clears_state() {
        let mut session = busy();
        assert_eq!(session.toggle_camera(), CameraCommand::Stop);
        assert_eq!(session.mode(), AppMode::ReadyCameraOff);
        assert_cleared(&session);

        session.error = Some("old".into());
        assert_eq!(session.toggle_camera(), CameraCommand::Start(3));
        assert_cleared(&session);
    }

    #[test]
    fn test_reset_returns_to_camera_off() {
        let mut session = busy();
        assert_eq!(session.reset(), CameraCommand::Stop);
        assert_eq!(session.mode(), AppMode::ReadyCameraOff);
        assert_cleared(&session);

        assert_eq!(session.reset(), CameraCommand::None);
        assert_eq!(session.mode(), AppMode::ReadyCameraOff);
    }

    #[test]
    fn test_capture_without_camera_is_noop() {
        let mut session = ready();
        assert!(!session.capture(Some(&frame()), &ENCODER));
        assert!(session.snapshot().is_none());
    }

    #[test]
    fn test_capture_without_frame_is_noop() {
        let mut session = ready();
        session.toggle_camera();
        assert!(!session.capture(None, &ENCODER));
        assert!(session.snapshot().is_none());
    }

    #[test]
    fn test_capture_encoder_failure_keeps_no_snapshot() {
        let mut session = ready();
        session.toggle_camera();
        assert!(!session.capture(Some(&frame()), &StubEncoder { fail: true }));
        assert!(session.snapshot().is_none());
    }

    #[test]
    fn test_capture_stores_snapshot() {
        let mut session = ready();
        session.toggle_camera();
        assert!(session.capture(Some(&frame()), &ENCODER));
        assert_eq!(session.snapshot().unwrap().width, 4);
    }

    #[test]
    fn test_model_failure_never_starts_loop() {
        let mut session = Session::new();
        session.begin_loading();
        assert!(session.models_failed("missing tiny_face_detector.onnx"));
        assert_eq!(session.mode(), AppMode::Error);
        assert_eq!(session.error(), Some(MODEL_LOAD_FAILED));

        for _ in 0..3 {
            assert_eq!(session.toggle_camera(), CameraCommand::None);
            assert_eq!(session.mode(), AppMode::Error);
        }
        assert_eq!(session.reset(), CameraCommand::None);
        assert!(!session.models_loaded());
        assert!(!session.apply_detections(batch(0, 1)));
    }

    #[test]
    fn test_toggle_before_models_ready_is_noop() {
        let mut session = Session::new();
        assert_eq!(session.toggle_camera(), CameraCommand::None);
        session.begin_loading();
        assert_eq!(session.toggle_camera(), CameraCommand::None);
        assert_eq!(session.mode(), AppMode::Loading);
    }

    #[test]
    fn test_only_newest_batch_is_shown() {
        let mut session = ready();
        session.toggle_camera();

        assert!(session.apply_detections(batch(1, 2)));
        assert!(!session.apply_detections(batch(1, 1)));
        assert!(!session.apply_detections(batch(1, 2)));
        assert_eq!(session.current_batch().unwrap().seq, 2);
        assert!(session.apply_detections(batch(1, 3)));
        assert_eq!(session.current_batch().unwrap().seq, 3);
    }

    #[test]
    fn test_stale_generation_is_discarded() {
        let mut session = ready();
        session.toggle_camera(); // generation 1
        session.toggle_camera(); // off, generation 2
        session.toggle_camera(); // on, generation 3

        assert!(!session.apply_detections(batch(1, 9)));
        assert!(session.detections().is_empty());
        assert!(session.apply_detections(batch(3, 1)));
    }

    #[test]
    fn test_batches_ignored_while_camera_off() {
        let mut session = ready();
        session.toggle_camera();
        session.toggle_camera();
        assert!(!session.apply_detections(batch(session.generation(), 1)));
    }

    #[test]
    fn test_camera_failure_turns_camera_off() {
        let mut session = ready();
        session.toggle_camera();
        session.apply_detections(batch(1, 1));

        assert!(!session.camera_failed(0, "stale"));
        assert!(session.camera_failed(1, "camera access denied"));
        assert_eq!(session.mode(), AppMode::ReadyCameraOff);
        assert_eq!(session.error(), Some("camera access denied"));
        assert!(session.detections().is_empty());
    }

    #[test]
    fn test_processing_only_while_camera_on() {
        let mut session = ready();
        session.set_processing(true);
        assert!(!session.is_processing());
        session.toggle_camera();
        session.set_processing(true);
        assert!(session.is_processing());
        session.toggle_camera();
        assert!(!session.is_processing());
    }

    #[rstest]
    #[case(0.5, 0.5)]
    #[case(0.34, 0.3)]
    #[case(0.36, 0.4)]
    #[case(0.0, 0.1)]
    #[case(0.05, 0.1)]
    #[case(1.0, 0.9)]
    #[case(-3.0, 0.1)]
    fn test_set_confidence_clamps_and_snaps(#[case] input: f32, #[case] expected: f32) {
        let mut session = ready();
        let stored = session.set_confidence(input);
        assert!((stored - expected).abs() < 1e-6, "{input} -> {stored}");
        assert_eq!(stored, session.confidence());
    }

    #[test]
    fn test_set_confidence_ignores_nan() {
        let mut session = ready();
        session.set_confidence(0.7);
        assert!((session.set_confidence(f32::NAN) - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_default_confidence() {
        assert!((Session::new().confidence() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_settings_only_toggle_with_camera_on() {
        let mut session = ready();
        assert!(!session.toggle_settings());
        session.toggle_camera();
        assert!(session.toggle_settings());
        assert!(!session.toggle_settings());
    }

    #[test]
    fn test_reset_keeps_model_failure_visible() {
        let mut session = Session::new();
        session.begin_loading();
        session.models_failed("corrupt age_gender_model.onnx");

        assert_eq!(session.reset(), CameraCommand::None);
        assert_eq!(session.mode(), AppMode::Error);
        assert_eq!(session.error(), Some(MODEL_LOAD_FAILED));
    }
}

//! Live detection loop: capture → ticker → inference, on three threads.
//!
//! ```text
//! capture ──publish──▶ LatestFrame ◀──every interval── ticker ──offer──▶ FrameSlot ──▶ inference
//! ```
//!
//! The capture thread keeps `LatestFrame` current at camera rate. The ticker
//! hands the newest frame to the inference worker through a one-element
//! slot: if the worker has not picked up the previous tick yet, that tick is
//! replaced and counted as dropped. One inference runs at a time.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};

use crate::capture::domain::camera::{Camera, VideoConstraints};
use crate::detection::domain::face_analysis::FaceAnalysis;
use crate::detection::domain::inference_pipeline::InferencePipeline;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::constants::DETECTION_INTERVAL;
use crate::shared::frame::Frame;

/// Pipeline shared between successive loops so that restarting the camera
/// does not reload the models.
pub type SharedPipeline = Arc<Mutex<InferencePipeline>>;

/// Results of one completed inference.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectionBatch {
    /// Camera generation the loop was started for.
    pub generation: u64,
    /// Increases by one per completed inference within a loop.
    pub seq: u64,
    /// Size of the frame the results are expressed in.
    pub frame_size: (u32, u32),
    pub results: Vec<FaceAnalysis>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum LoopEvent {
    /// The camera is streaming at the given resolution.
    Started { generation: u64, width: u32, height: u32 },
    Detections(DetectionBatch),
    /// An inference started (`true`) or finished (`false`).
    Processing(bool),
    /// One tick's inference failed; the loop keeps running.
    TickFailed(String),
    /// The camera could not be opened or stopped delivering frames.
    CameraError { generation: u64, message: String },
    /// The camera has been released.
    Stopped { generation: u64 },
}

/// Most recent frame delivered by the camera.
#[derive(Clone, Default)]
pub struct LatestFrame(Arc<Mutex<Option<Arc<Frame>>>>);

impl LatestFrame {
    pub fn publish(&self, frame: Frame) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(frame));
    }

    pub fn get(&self) -> Option<Arc<Frame>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn clear(&self) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Single-slot, latest-wins hand-off between the ticker and the worker.
#[derive(Clone)]
pub struct FrameSlot {
    tx: Sender<Arc<Frame>>,
    rx: Receiver<Arc<Frame>>,
}

impl FrameSlot {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::bounded(1);
        Self { tx, rx }
    }

    /// Posts a frame, replacing a pending one. Returns `true` when a pending
    /// frame was dropped.
    pub fn offer(&self, frame: Arc<Frame>) -> bool {
        match self.tx.try_send(frame) {
            Ok(()) => false,
            Err(TrySendError::Full(frame)) => {
                // Only the ticker sends, so after draining the slot the
                // retry cannot find it full again.
                let dropped = self.rx.try_recv().is_ok();
                let _ = self.tx.try_send(frame);
                dropped
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    fn take(&self, timeout: Duration) -> Option<Arc<Frame>> {
        match self.rx.recv_timeout(timeout) {
            Ok(frame) => Some(frame),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl Default for FrameSlot {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
pub struct LoopConfig {
    pub generation: u64,
    pub interval: Duration,
    pub constraints: VideoConstraints,
}

impl LoopConfig {
    pub fn new(generation: u64) -> Self {
        Self {
            generation,
            interval: DETECTION_INTERVAL,
            constraints: VideoConstraints::default(),
        }
    }
}

/// Handle to a running loop. Dropping it does not stop the threads.
pub struct DetectionLoop {
    generation: u64,
    cancelled: Arc<AtomicBool>,
    dropped: Arc<AtomicU64>,
    latest: LatestFrame,
    events: Receiver<LoopEvent>,
    handles: Vec<JoinHandle<()>>,
}

impl DetectionLoop {
    pub fn spawn(
        camera: Box<dyn Camera>,
        pipeline: SharedPipeline,
        config: LoopConfig,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        let generation = config.generation;
        let cancelled = Arc::new(AtomicBool::new(false));
        let dropped = Arc::new(AtomicU64::new(0));
        let latest = LatestFrame::default();
        let slot = FrameSlot::new();
        let (event_tx, events) = crossbeam_channel::unbounded();

        log::info!(
            "Starting detection loop (generation {generation}, every {}ms)",
            config.interval.as_millis()
        );

        let handles = vec![
            spawn_capture(
                camera,
                config.clone(),
                latest.clone(),
                event_tx.clone(),
                cancelled.clone(),
            ),
            spawn_ticker(
                config.interval,
                latest.clone(),
                slot.clone(),
                dropped.clone(),
                cancelled.clone(),
            ),
            spawn_inference(
                pipeline,
                config,
                slot,
                event_tx,
                logger,
                dropped.clone(),
                cancelled.clone(),
            ),
        ];

        Self {
            generation,
            cancelled,
            dropped,
            latest,
            events,
            handles,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn events(&self) -> &Receiver<LoopEvent> {
        &self.events
    }

    /// Latest camera frame, for display and snapshots.
    pub fn latest_frame(&self) -> Option<Arc<Frame>> {
        self.latest.get()
    }

    pub fn dropped_ticks(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn is_stopped(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Signals every thread to exit at its next check. Does not block.
    pub fn stop(&self) {
        if !self.cancelled.swap(true, Ordering::Relaxed) {
            log::info!("Stopping detection loop (generation {})", self.generation);
        }
    }

    /// Stops the loop and waits for its threads to finish.
    pub fn join(mut self) {
        self.stop();
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                log::warn!("detection loop thread panicked");
            }
        }
    }
}

fn spawn_capture(
    mut camera: Box<dyn Camera>,
    config: LoopConfig,
    latest: LatestFrame,
    events: Sender<LoopEvent>,
    cancelled: Arc<AtomicBool>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let generation = config.generation;
        match camera.open(&config.constraints) {
            Ok((width, height)) => {
                let _ = events.send(LoopEvent::Started {
                    generation,
                    width,
                    height,
                });
            }
            Err(e) => {
                log::warn!("Camera failed to open: {e}");
                cancelled.store(true, Ordering::Relaxed);
                let _ = events.send(LoopEvent::CameraError {
                    generation,
                    message: e.to_string(),
                });
                let _ = events.send(LoopEvent::Stopped { generation });
                return;
            }
        }

        while !cancelled.load(Ordering::Relaxed) {
            match camera.read_frame() {
                Ok(Some(frame)) => latest.publish(frame),
                Ok(None) => thread::sleep(Duration::from_millis(5)),
                Err(e) => {
                    log::warn!("Camera stopped delivering frames: {e}");
                    cancelled.store(true, Ordering::Relaxed);
                    let _ = events.send(LoopEvent::CameraError {
                        generation,
                        message: e.to_string(),
                    });
                }
            }
        }

        camera.close();
        latest.clear();
        let _ = events.send(LoopEvent::Stopped { generation });
    })
}

fn spawn_ticker(
    interval: Duration,
    latest: LatestFrame,
    slot: FrameSlot,
    dropped: Arc<AtomicU64>,
    cancelled: Arc<AtomicBool>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut next = Instant::now() + interval;
        loop {
            let now = Instant::now();
            if next > now {
                thread::sleep(next - now);
            }
            next += interval;
            if cancelled.load(Ordering::Relaxed) {
                break;
            }
            // No frame yet: nothing to analyze this tick.
            let Some(frame) = latest.get() else {
                continue;
            };
            if slot.offer(frame) {
                let total = dropped.fetch_add(1, Ordering::Relaxed) + 1;
                log::debug!("tick replaced a pending frame ({total} dropped)");
            }
        }
    })
}

#[allow(clippy::too_many_arguments)]
fn spawn_inference(
    pipeline: SharedPipeline,
    config: LoopConfig,
    slot: FrameSlot,
    events: Sender<LoopEvent>,
    mut logger: Box<dyn PipelineLogger>,
    dropped: Arc<AtomicU64>,
    cancelled: Arc<AtomicBool>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut seq: u64 = 0;
        while !cancelled.load(Ordering::Relaxed) {
            let Some(frame) = slot.take(config.interval) else {
                continue;
            };

            let _ = events.send(LoopEvent::Processing(true));
            let start = Instant::now();
            let result = pipeline
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .analyze(&frame);
            logger.timing("inference", start.elapsed().as_secs_f64() * 1000.0);
            let _ = events.send(LoopEvent::Processing(false));

            match result {
                Ok(results) => {
                    seq += 1;
                    logger.metric("faces", results.len() as f64);
                    logger.progress(seq as usize);
                    let _ = events.send(LoopEvent::Detections(DetectionBatch {
                        generation: config.generation,
                        seq,
                        frame_size: frame.size(),
                        results,
                    }));
                }
                Err(e) => {
                    log::warn!("Detection failed on frame {}: {e}", frame.sequence());
                    let _ = events.send(LoopEvent::TickFailed(e.to_string()));
                }
            }
        }

        logger.metric("dropped_ticks", dropped.load(Ordering::Relaxed) as f64);
        logger.info(&format!(
            "Detection loop finished (generation {})",
            config.generation
        ));
        logger.summary();
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::domain::camera::CameraError;
    use crate::capture::infrastructure::still_image_camera::StillImageCamera;
    use crate::detection::domain::face_detector::{FaceDetection, FaceDetector};
    use crate::detection::domain::inference_pipeline::test_support::*;
    use crate::detection::domain::inference_pipeline::ConfidenceThreshold;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;

    const WAIT: Duration = Duration::from_secs(5);

    fn frame(seq: u64) -> Frame {
        Frame::new(vec![0u8; 64 * 48 * 3], 64, 48, 3, seq)
    }

    fn camera() -> Box<dyn Camera> {
        Box::new(StillImageCamera::from_frame(frame(0)).with_frame_interval(Duration::from_millis(2)))
    }

    fn shared(pipeline: InferencePipeline) -> SharedPipeline {
        Arc::new(Mutex::new(pipeline))
    }

    fn config(generation: u64, interval_ms: u64) -> LoopConfig {
        LoopConfig {
            interval: Duration::from_millis(interval_ms),
            ..LoopConfig::new(generation)
        }
    }

    fn next_batch(detection_loop: &DetectionLoop) -> DetectionBatch {
        let deadline = Instant::now() + WAIT;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match detection_loop.events().recv_timeout(remaining) {
                Ok(LoopEvent::Detections(batch)) => return batch,
                Ok(_) => continue,
                Err(e) => panic!("no detections before timeout: {e}"),
            }
        }
    }

    struct FailingCamera;

    impl Camera for FailingCamera {
        fn open(&mut self, _c: &VideoConstraints) -> Result<(u32, u32), CameraError> {
            Err(CameraError::PermissionDenied("blocked by user".into()))
        }
        fn read_frame(&mut self) -> Result<Option<Frame>, CameraError> {
            Err(CameraError::NotOpen)
        }
        fn close(&mut self) {}
    }

    /// Opens fine but never has a frame ready.
    struct WarmingUpCamera;

    impl Camera for WarmingUpCamera {
        fn open(&mut self, _c: &VideoConstraints) -> Result<(u32, u32), CameraError> {
            Ok((64, 48))
        }
        fn read_frame(&mut self) -> Result<Option<Frame>, CameraError> {
            Ok(None)
        }
        fn close(&mut self) {}
    }

    struct SlowDetector(Duration);

    impl FaceDetector for SlowDetector {
        fn detect(
            &mut self,
            _frame: &Frame,
        ) -> Result<Vec<FaceDetection>, Box<dyn std::error::Error>> {
            thread::sleep(self.0);
            Ok(vec![detection(5.0, 5.0, 20.0, 0.9)])
        }
    }

    #[test]
    fn test_frame_slot_latest_wins() {
        let slot = FrameSlot::new();
        assert!(!slot.offer(Arc::new(frame(1))));
        assert!(slot.offer(Arc::new(frame(2))));
        assert!(slot.offer(Arc::new(frame(3))));
        assert_eq!(slot.pending(), 1);

        let taken = slot.take(Duration::from_millis(10)).unwrap();
        assert_eq!(taken.sequence(), 3);
        assert_eq!(slot.pending(), 0);
        assert!(slot.take(Duration::from_millis(1)).is_none());
    }

    #[test]
    fn test_latest_frame_publish_and_clear() {
        let latest = LatestFrame::default();
        assert!(latest.get().is_none());
        latest.publish(frame(7));
        latest.publish(frame(8));
        assert_eq!(latest.get().unwrap().sequence(), 8);
        latest.clear();
        assert!(latest.get().is_none());
    }

    #[test]
    fn test_emits_batches_for_generation() {
        let pipeline = shared(stub_pipeline(vec![detection(5.0, 5.0, 20.0, 0.9)], 0.5));
        let detection_loop = DetectionLoop::spawn(
            camera(),
            pipeline,
            config(3, 10),
            Box::new(NullPipelineLogger),
        );

        let first = next_batch(&detection_loop);
        let second = next_batch(&detection_loop);
        assert_eq!(first.generation, 3);
        assert_eq!(first.frame_size, (64, 48));
        assert_eq!(first.results.len(), 1);
        assert!(second.seq > first.seq);
        assert!(detection_loop.latest_frame().is_some());

        detection_loop.join();
    }

    #[test]
    fn test_stop_releases_camera() {
        let pipeline = shared(stub_pipeline(vec![], 0.5));
        let detection_loop = DetectionLoop::spawn(
            camera(),
            pipeline,
            config(1, 10),
            Box::new(NullPipelineLogger),
        );
        next_batch(&detection_loop);
        detection_loop.stop();
        assert!(detection_loop.is_stopped());

        let events = detection_loop.events().clone();
        detection_loop.join();
        let stopped = events
            .try_iter()
            .any(|e| e == LoopEvent::Stopped { generation: 1 });
        assert!(stopped);
    }

    #[test]
    fn test_camera_failure_stops_loop() {
        let pipeline = shared(stub_pipeline(vec![], 0.5));
        let detection_loop = DetectionLoop::spawn(
            Box::new(FailingCamera),
            pipeline,
            config(2, 10),
            Box::new(NullPipelineLogger),
        );

        let event = detection_loop.events().recv_timeout(WAIT).unwrap();
        match event {
            LoopEvent::CameraError {
                generation,
                message,
            } => {
                assert_eq!(generation, 2);
                assert!(message.contains("blocked by user"));
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(detection_loop.is_stopped());
        detection_loop.join();
    }

    #[test]
    fn test_tick_failures_do_not_stop_loop() {
        let detection_loop = DetectionLoop::spawn(
            camera(),
            shared(failing_pipeline()),
            config(1, 10),
            Box::new(NullPipelineLogger),
        );

        let mut failures = 0;
        let deadline = Instant::now() + WAIT;
        while failures < 2 && Instant::now() < deadline {
            if let Ok(LoopEvent::TickFailed(msg)) =
                detection_loop.events().recv_timeout(Duration::from_millis(100))
            {
                assert!(msg.contains("detector exploded"));
                failures += 1;
            }
        }
        assert_eq!(failures, 2);
        assert!(!detection_loop.is_stopped());
        detection_loop.join();
    }

    #[test]
    fn test_slow_inference_drops_ticks_instead_of_overlapping() {
        let pipeline = InferencePipeline::new(
            Box::new(SlowDetector(Duration::from_millis(60))),
            Box::new(StubLandmarks),
            Box::new(StubExpressions),
            Box::new(StubAgeGender { age: 30.0 }),
            ConfidenceThreshold::new(0.5),
        );
        let detection_loop = DetectionLoop::spawn(
            camera(),
            shared(pipeline),
            config(1, 10),
            Box::new(NullPipelineLogger),
        );

        let mut last_seq = 0;
        for _ in 0..3 {
            let batch = next_batch(&detection_loop);
            assert_eq!(batch.seq, last_seq + 1);
            last_seq = batch.seq;
        }
        assert!(detection_loop.dropped_ticks() > 0);
        detection_loop.join();
    }

    #[test]
    fn test_ticks_without_a_frame_are_skipped_silently() {
        // Any inference would fail loudly, so silence means no tick ran one.
        let detection_loop = DetectionLoop::spawn(
            Box::new(WarmingUpCamera),
            shared(failing_pipeline()),
            config(4, 10),
            Box::new(NullPipelineLogger),
        );

        let started = detection_loop.events().recv_timeout(WAIT).unwrap();
        assert_eq!(
            started,
            LoopEvent::Started {
                generation: 4,
                width: 64,
                height: 48
            }
        );

        thread::sleep(Duration::from_millis(150));
        let unexpected: Vec<_> = detection_loop.events().try_iter().collect();
        assert!(unexpected.is_empty(), "unexpected events {unexpected:?}");
        assert!(!detection_loop.is_stopped());
        assert!(detection_loop.latest_frame().is_none());
        assert_eq!(detection_loop.dropped_ticks(), 0);

        detection_loop.join();
    }
}

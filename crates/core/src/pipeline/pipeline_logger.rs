use std::collections::HashMap;
use std::time::Instant;

/// Cross-cutting logger for detection-loop events.
///
/// The loop reports through this trait so the CLI can print a run summary
/// while the desktop stays silent.
pub trait PipelineLogger: Send {
    /// Report that `processed` frames have been analyzed so far.
    fn progress(&mut self, processed: usize);

    /// Record how long a named stage took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. faces per frame).
    fn metric(&mut self, name: &str, value: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger for the desktop GUI and tests.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _processed: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// CLI logger: keeps per-stage timings and metrics and logs a summary when
/// the loop ends.
///
/// Progress lines are throttled to one every `throttle_frames` frames.
pub struct StdoutPipelineLogger {
    throttle_frames: usize,
    timings: HashMap<String, Vec<f64>>,
    metrics: HashMap<String, Vec<f64>>,
    start_time: Instant,
    processed: usize,
    messages: Vec<String>,
}

impl StdoutPipelineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            processed: 0,
            messages: Vec::new(),
        }
    }

    /// Returns the formatted summary, or `None` if nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let frames = self.processed;
        let mut lines = vec![format!(
            "Detection summary ({frames} frames analyzed, {:.1}s total):",
            elapsed_ms / 1000.0
        )];

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = mean(durations);
            let max_ms = durations.iter().copied().fold(0.0, f64::max);
            lines.push(format!(
                "  {stage:12}: avg {avg_ms:6.1}ms  max {max_ms:6.1}ms  total {total_ms:7.0}ms"
            ));
        }

        let mut metric_names: Vec<_> = self.metrics.keys().collect();
        metric_names.sort();
        for name in metric_names {
            let values = &self.metrics[name];
            let last = values.last().copied().unwrap_or(0.0);
            lines.push(format!("  {name}: avg {:.1}  last {last:.0}", mean(values)));
        }

        if frames > 0 && elapsed_ms > 0.0 {
            let rate = frames as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Analysis rate: {rate:.1} fps"));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(50)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, processed: usize) {
        self.processed = processed;
        if processed % self.throttle_frames == 0 {
            log::info!("Analyzed {processed} frames");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .push(value);
    }

    fn info(&mut self, message: &str) {
        self.messages.push(message.to_string());
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_null_logger_accepts_everything() {
        let mut logger = NullPipelineLogger;
        logger.progress(1);
        logger.timing("inference", 5.0);
        logger.metric("faces", 3.0);
        logger.info("hello");
        logger.summary();
    }

    #[test]
    fn test_timing_records_values() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.timing("inference", 20.0);
        logger.timing("inference", 30.0);

        let values = logger.timings_for("inference").unwrap();
        assert_eq!(values, &[20.0, 30.0]);
        assert!(logger.timings_for("capture").is_none());
    }

    #[test]
    fn test_summary_lists_stages_and_metrics() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.progress(4);
        logger.timing("inference", 20.0);
        logger.timing("inference", 40.0);
        logger.metric("faces", 1.0);
        logger.metric("faces", 2.0);
        logger.metric("dropped_ticks", 3.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("4 frames analyzed"));
        assert!(summary.contains("inference"));
        assert!(summary.contains("max   40.0ms"));
        assert!(summary.contains("faces: avg 1.5"));
        assert!(summary.contains("dropped_ticks: avg 3.0  last 3"));
        assert!(summary.contains("fps"));
    }

    #[test]
    fn test_empty_summary_returns_none() {
        assert!(StdoutPipelineLogger::new(10).summary_string().is_none());
    }

    #[test]
    fn test_progress_tracks_latest_count() {
        let mut logger = StdoutPipelineLogger::new(10);
        for i in 1..=25 {
            logger.progress(i);
        }
        assert_eq!(logger.processed, 25);
    }

    #[test]
    fn test_info_stores_messages() {
        let mut logger = StdoutPipelineLogger::default();
        logger.info("camera opened");
        assert_eq!(logger.messages, vec!["camera opened".to_string()]);
        assert_eq!(logger.throttle_frames, 50);
    }

    #[test]
    fn test_mean() {
        assert_relative_eq!(mean(&[1.0, 2.0, 6.0]), 3.0);
        assert_relative_eq!(mean(&[]), 0.0);
    }
}

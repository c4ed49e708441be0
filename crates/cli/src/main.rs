use std::path::{Path, PathBuf};
use std::process;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};

use facecam_core::capture::domain::camera::Camera;
use facecam_core::capture::infrastructure::nokhwa_camera::{list_cameras, NokhwaCamera};
use facecam_core::capture::infrastructure::still_image_camera::StillImageCamera;
use facecam_core::detection::domain::face_analysis::FaceAnalysis;
use facecam_core::detection::domain::inference_pipeline::{ConfidenceThreshold, InferencePipeline};
use facecam_core::export::infrastructure::jpeg_snapshot_encoder::JpegSnapshotEncoder;
use facecam_core::export::snapshot::{default_download_path, save_snapshot};
use facecam_core::models::model_loader::{load_models, LoadOptions, LoadProgressFn, ModelBundle};
use facecam_core::pipeline::analyze_image_use_case::AnalyzeImageUseCase;
use facecam_core::pipeline::detection_loop::{DetectionLoop, LoopConfig, LoopEvent};
use facecam_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use facecam_core::session::session_state::{CameraCommand, Session};
use facecam_core::shared::config::AppConfig;
use facecam_core::shared::constants::IMAGE_EXTENSIONS;
use facecam_core::shared::model_resolver::ModelSource;

/// Webcam face analysis: detection, landmarks, expressions, age and gender.
#[derive(Parser)]
#[command(name = "facecam")]
struct Cli {
    /// Config file (default: <config dir>/facecam/config.json).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Model directory or http(s) base URL.
    #[arg(long, global = true)]
    models: Option<String>,

    /// Camera device index.
    #[arg(long, global = true)]
    camera: Option<u32>,

    /// Minimum face confidence (0.1-0.9).
    #[arg(long, global = true)]
    confidence: Option<f32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a single image file.
    Detect {
        input: PathBuf,

        /// Write a copy of the image with face boxes drawn in.
        #[arg(long)]
        annotate: Option<PathBuf>,

        /// Print results as JSON instead of labels.
        #[arg(long)]
        json: bool,
    },
    /// Run the live detection loop and log results.
    Live {
        /// Stop after this many seconds (default: run until the camera fails).
        #[arg(long)]
        duration: Option<u64>,

        /// Save a snapshot to this path when the loop ends.
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Replay an image file instead of opening a camera.
        #[arg(long)]
        source: Option<PathBuf>,
    },
    /// List available cameras.
    Devices,
    /// Print the effective configuration.
    Config,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = effective_config(&cli)?;

    match cli.command {
        Command::Detect {
            input,
            annotate,
            json,
        } => run_detect(&config, &input, annotate.as_deref(), json),
        Command::Live {
            duration,
            snapshot,
            source,
        } => run_live(
            &config,
            duration.map(Duration::from_secs),
            snapshot,
            source.as_deref(),
        ),
        Command::Devices => run_devices(),
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn effective_config(cli: &Cli) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    if let Some(models) = &cli.models {
        config.model_source = ModelSource::from(models.as_str());
    }
    if let Some(camera) = cli.camera {
        config.camera_index = camera;
    }
    if let Some(confidence) = cli.confidence {
        config.confidence = confidence;
    }
    config.validate()?;
    Ok(config)
}

fn load_pipeline(
    config: &AppConfig,
    confidence: ConfidenceThreshold,
) -> Result<InferencePipeline, Box<dyn std::error::Error>> {
    let options = LoadOptions {
        source: config.model_source.clone(),
        confidence,
    };
    let progress: LoadProgressFn = Arc::new(download_progress);
    let pipeline = load_models(&options, Some(progress))?;
    Ok(pipeline)
}

fn run_detect(
    config: &AppConfig,
    input: &Path,
    annotate: Option<&Path>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !input.exists() {
        return Err(format!("Input file not found: {}", input.display()).into());
    }
    if !is_image(input) {
        return Err(format!("Not a supported image: {}", input.display()).into());
    }

    let mut session = Session::new();
    let confidence = ConfidenceThreshold::new(session.set_confidence(config.confidence));
    let pipeline = load_pipeline(config, confidence)?;
    let mut use_case = AnalyzeImageUseCase::new(pipeline);
    let results = use_case.execute(input, annotate)?;

    if json {
        let faces: Vec<_> = results.iter().map(face_json).collect();
        println!("{}", serde_json::to_string_pretty(&faces)?);
    } else if results.is_empty() {
        println!("No faces detected");
    } else {
        for (i, face) in results.iter().enumerate() {
            println!("Face {}: {}", i + 1, face.label());
        }
    }
    Ok(())
}

fn run_live(
    config: &AppConfig,
    duration: Option<Duration>,
    snapshot: Option<PathBuf>,
    source: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::new();
    let confidence = ConfidenceThreshold::new(session.set_confidence(config.confidence));

    session.begin_loading();
    let pipeline = match load_pipeline(config, confidence) {
        Ok(pipeline) => {
            session.models_loaded();
            pipeline
        }
        Err(e) => {
            session.models_failed(&e.to_string());
            return Err(e);
        }
    };

    let CameraCommand::Start(generation) = session.toggle_camera() else {
        return Err("camera could not be started".into());
    };

    let camera: Box<dyn Camera> = match source {
        Some(path) => Box::new(StillImageCamera::from_path(path)),
        None => Box::new(NokhwaCamera::new()),
    };
    let loop_config = LoopConfig {
        generation,
        interval: config.detection_interval(),
        constraints: config.video_constraints(),
    };
    let detection_loop = DetectionLoop::spawn(
        camera,
        Arc::new(Mutex::new(pipeline)),
        loop_config,
        Box::new(StdoutPipelineLogger::default()),
    );

    let deadline = duration.map(|d| Instant::now() + d);
    let mut camera_error = None;
    loop {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }
        let event = match detection_loop
            .events()
            .recv_timeout(Duration::from_millis(100))
        {
            Ok(event) => event,
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
        };
        match event {
            LoopEvent::Started { width, height, .. } => {
                log::info!("Camera streaming at {width}x{height}");
            }
            LoopEvent::Detections(batch) => {
                let seq = batch.seq;
                if session.apply_detections(batch) {
                    for face in session.detections() {
                        println!("[{seq}] {}", face.label());
                    }
                }
            }
            LoopEvent::Processing(processing) => session.set_processing(processing),
            LoopEvent::TickFailed(_) => {}
            LoopEvent::CameraError {
                generation,
                message,
            } => {
                session.camera_failed(generation, &message);
                camera_error = Some(message);
                break;
            }
            LoopEvent::Stopped { .. } => break,
        }
    }

    if let Some(path) = snapshot {
        let frame = detection_loop.latest_frame();
        if session.capture(frame.as_deref(), &JpegSnapshotEncoder::default()) {
            if let Some(snap) = session.snapshot() {
                let path = if path.is_dir() {
                    default_download_path(&path)
                } else {
                    path
                };
                save_snapshot(snap, &path)?;
            }
        } else {
            log::warn!("No frame available for a snapshot");
        }
    }

    session.reset();
    detection_loop.join();

    match camera_error {
        Some(message) => Err(message.into()),
        None => Ok(()),
    }
}

fn run_devices() -> Result<(), Box<dyn std::error::Error>> {
    let cameras = list_cameras()?;
    if cameras.is_empty() {
        println!("No cameras found");
    }
    for (index, name) in cameras {
        println!("[{index}] {name}");
    }
    Ok(())
}

fn face_json(face: &FaceAnalysis) -> serde_json::Value {
    let bbox = face.detection.bbox;
    let (expression, expression_score) = face.expressions.dominant();
    serde_json::json!({
        "box": { "x": bbox.x, "y": bbox.y, "width": bbox.width, "height": bbox.height },
        "score": face.detection.score,
        "age": face.rounded_age(),
        "gender": face.gender.to_string(),
        "gender_probability": face.gender_probability,
        "expression": expression.to_string(),
        "expression_score": expression_score,
        "label": face.label(),
    })
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn download_progress(bundle: ModelBundle, downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading {bundle} model... {pct}%");
    } else {
        eprint!("\rDownloading {bundle} model... {downloaded} bytes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("facecam").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_is_image() {
        assert!(is_image(Path::new("photo.JPG")));
        assert!(is_image(Path::new("a/b/face.png")));
        assert!(!is_image(Path::new("clip.mp4")));
        assert!(!is_image(Path::new("noext")));
    }

    #[test]
    fn test_flags_override_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "camera_index": 1, "confidence": 0.3 }"#).unwrap();
        let path_arg = path.to_str().unwrap();

        let cli = parse(&["--config", path_arg, "--camera", "4", "--models", "https://example.com/m/", "config"]);
        let config = effective_config(&cli).unwrap();
        assert_eq!(config.camera_index, 4);
        assert!((config.confidence - 0.3).abs() < 1e-6);
        assert_eq!(
            config.model_source,
            ModelSource::Url("https://example.com/m".into())
        );
    }

    #[test]
    fn test_invalid_confidence_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let cli = parse(&["--config", path.to_str().unwrap(), "--confidence", "3", "devices"]);
        assert!(effective_config(&cli).is_err());
    }

    #[test]
    fn test_parses_live_options() {
        let cli = parse(&["live", "--duration", "5", "--snapshot", "out.jpg"]);
        match cli.command {
            Command::Live {
                duration, snapshot, ..
            } => {
                assert_eq!(duration, Some(5));
                assert_eq!(snapshot, Some(PathBuf::from("out.jpg")));
            }
            _ => panic!("expected live"),
        }
    }
}

use std::path::Path;

use crate::detection::domain::face_analysis::FaceAnalysis;
use crate::detection::domain::inference_pipeline::InferencePipeline;
use crate::render::overlay::{draw_scene, OverlayScene};
use crate::shared::frame::Frame;

/// Single-image analysis: read → analyze → optionally write an annotated copy.
pub struct AnalyzeImageUseCase {
    pipeline: InferencePipeline,
}

impl AnalyzeImageUseCase {
    pub fn new(pipeline: InferencePipeline) -> Self {
        Self { pipeline }
    }

    pub fn execute(
        &mut self,
        input_path: &Path,
        annotated_path: Option<&Path>,
    ) -> Result<Vec<FaceAnalysis>, Box<dyn std::error::Error>> {
        let img = image::open(input_path)?.to_rgb8();
        let frame = Frame::from_rgb_image(img, 0);
        log::info!(
            "Analyzing {} ({}x{})",
            input_path.display(),
            frame.width(),
            frame.height()
        );

        let results = self.pipeline.analyze(&frame)?;

        if let Some(path) = annotated_path {
            let mut annotated = frame
                .to_rgb_image()
                .ok_or("Failed to create image from frame data")?;
            let scene = OverlayScene::from_results(&results, frame.size(), frame.size());
            draw_scene(&mut annotated, &scene);
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            annotated.save(path)?;
            log::info!("Wrote annotated image to {}", path.display());
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::inference_pipeline::test_support::*;
    use crate::render::overlay::BOX_COLOR;
    use tempfile::TempDir;

    fn write_input(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("input.png");
        image::RgbImage::from_pixel(64, 48, image::Rgb([0, 0, 0]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_returns_results() {
        let tmp = TempDir::new().unwrap();
        let input = write_input(tmp.path());
        let mut use_case =
            AnalyzeImageUseCase::new(stub_pipeline(vec![detection(10.0, 10.0, 20.0, 0.9)], 0.5));

        let results = use_case.execute(&input, None).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].label(), "Age: 40 | Gender: female | Confidence: 80%");
    }

    #[test]
    fn test_writes_annotated_copy() {
        let tmp = TempDir::new().unwrap();
        let input = write_input(tmp.path());
        let output = tmp.path().join("out").join("annotated.png");
        let mut use_case =
            AnalyzeImageUseCase::new(stub_pipeline(vec![detection(10.0, 10.0, 20.0, 0.9)], 0.5));

        use_case.execute(&input, Some(&output)).unwrap();
        let written = image::open(&output).unwrap().to_rgb8();
        assert_eq!(written.get_pixel(10, 10).0, BOX_COLOR);
        assert_eq!(written.get_pixel(20, 20).0, [0, 0, 0]);
    }

    #[test]
    fn test_missing_input_is_error() {
        let mut use_case = AnalyzeImageUseCase::new(stub_pipeline(vec![], 0.5));
        assert!(use_case.execute(Path::new("/nonexistent.png"), None).is_err());
    }

    #[test]
    fn test_pipeline_error_propagates() {
        let tmp = TempDir::new().unwrap();
        let input = write_input(tmp.path());
        let mut use_case = AnalyzeImageUseCase::new(failing_pipeline());
        assert!(use_case.execute(&input, None).is_err());
    }
}

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capture::domain::camera::{FacingMode, VideoConstraints};
use crate::shared::constants::{
    DEFAULT_CONFIDENCE, DEFAULT_MODEL_DIR, DETECTION_INTERVAL, IDEAL_CAPTURE_HEIGHT,
    IDEAL_CAPTURE_WIDTH,
};
use crate::shared::model_resolver::ModelSource;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Runtime configuration shared by the CLI and the desktop app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory or URL base holding the four model bundles.
    pub model_source: ModelSource,
    pub camera_index: u32,
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub detection_interval_ms: u64,
    /// Initial value of the confidence slider.
    pub confidence: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_source: ModelSource::Directory(PathBuf::from(DEFAULT_MODEL_DIR)),
            camera_index: 0,
            ideal_width: IDEAL_CAPTURE_WIDTH,
            ideal_height: IDEAL_CAPTURE_HEIGHT,
            detection_interval_ms: DETECTION_INTERVAL.as_millis() as u64,
            confidence: DEFAULT_CONFIDENCE,
        }
    }
}

impl AppConfig {
    /// `<config_dir>/facecam/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("facecam").join("config.json"))
    }

    /// Loads the config at the default location, falling back to defaults
    /// when the file does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };
        let config: Self = serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.detection_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "detection_interval_ms must be positive".into(),
            ));
        }
        if self.ideal_width == 0 || self.ideal_height == 0 {
            return Err(ConfigError::Invalid(format!(
                "ideal resolution must be non-zero, got {}x{}",
                self.ideal_width, self.ideal_height
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(ConfigError::Invalid(format!(
                "confidence must be between 0.0 and 1.0, got {}",
                self.confidence
            )));
        }
        Ok(())
    }

    pub fn detection_interval(&self) -> Duration {
        Duration::from_millis(self.detection_interval_ms)
    }

    pub fn video_constraints(&self) -> VideoConstraints {
        VideoConstraints {
            ideal_width: self.ideal_width,
            ideal_height: self.ideal_height,
            facing: FacingMode::User,
            device_index: self.camera_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_capture_preferences() {
        let config = AppConfig::default();
        assert_eq!(config.ideal_width, 1280);
        assert_eq!(config.ideal_height, 720);
        assert_eq!(config.detection_interval(), Duration::from_millis(100));
        assert_eq!(config.model_source, ModelSource::from("models"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = AppConfig::load_from(&tmp.path().join("config.json")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, r#"{ "camera_index": 2, "model_source": "/srv/models" }"#).unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.camera_index, 2);
        assert_eq!(config.model_source, ModelSource::from("/srv/models"));
        assert_eq!(config.ideal_width, 1280);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, r#"{ "detection_interval_ms": 0 }"#).unwrap();

        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let config = AppConfig {
            camera_index: 1,
            confidence: 0.7,
            ..AppConfig::default()
        };
        let json = serde_json::to_string_pretty(&config).unwrap();
        let back: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_video_constraints_use_user_facing_camera() {
        let constraints = AppConfig::default().video_constraints();
        assert_eq!(constraints.facing, FacingMode::User);
        assert_eq!(constraints.device_index, 0);
    }
}

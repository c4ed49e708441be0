use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::Receiver;

use facecam_core::detection::domain::inference_pipeline::{ConfidenceThreshold, InferencePipeline};
use facecam_core::models::model_loader::{load_models, LoadOptions, LoadProgressFn, ModelBundle};
use facecam_core::shared::config::AppConfig;

/// Messages sent from the loader thread to the UI.
pub enum LoaderMessage {
    DownloadProgress(ModelBundle, u64, u64),
    Loaded(InferencePipeline),
    Failed(String),
}

impl std::fmt::Debug for LoaderMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoaderMessage::DownloadProgress(bundle, dl, total) => {
                write!(f, "DownloadProgress({bundle}, {dl}, {total})")
            }
            LoaderMessage::Loaded(_) => write!(f, "Loaded"),
            LoaderMessage::Failed(e) => write!(f, "Failed({e})"),
        }
    }
}

/// Loads all four model bundles in the background. Returns the channel
/// receiver and a cancellation token; a cancelled load still runs to
/// completion but reports nothing.
pub fn spawn(
    config: &AppConfig,
    confidence: ConfidenceThreshold,
) -> (Receiver<LoaderMessage>, Arc<AtomicBool>) {
    let (tx, rx) = crossbeam_channel::unbounded::<LoaderMessage>();
    let cancelled = Arc::new(AtomicBool::new(false));
    let cancelled_clone = cancelled.clone();

    let options = LoadOptions {
        source: config.model_source.clone(),
        confidence,
    };

    thread::spawn(move || {
        let tx_progress = tx.clone();
        let cancelled_progress = cancelled_clone.clone();
        let progress: LoadProgressFn = Arc::new(move |bundle, downloaded, total| {
            if !cancelled_progress.load(Ordering::Relaxed) {
                let _ = tx_progress.send(LoaderMessage::DownloadProgress(bundle, downloaded, total));
            }
        });

        let message = match load_models(&options, Some(progress)) {
            Ok(pipeline) => {
                log::info!("Models loaded");
                LoaderMessage::Loaded(pipeline)
            }
            Err(e) => LoaderMessage::Failed(e.to_string()),
        };
        if !cancelled_clone.load(Ordering::Relaxed) {
            let _ = tx.send(message);
        }
    });

    (rx, cancelled)
}

/// Human-readable download status for the loading indicator.
pub fn progress_text(bundle: ModelBundle, downloaded: u64, total: u64) -> String {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0).min(100.0) as u32;
        format!("Downloading {bundle} model ({pct}%)")
    } else {
        format!("Downloading {bundle} model ({} KB)", downloaded / 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facecam_core::shared::model_resolver::ModelSource;
    use std::time::Duration;

    #[test]
    fn test_progress_text() {
        assert_eq!(
            progress_text(ModelBundle::AgeGender, 50, 200),
            format!("Downloading {} model (25%)", ModelBundle::AgeGender)
        );
        assert_eq!(
            progress_text(ModelBundle::AgeGender, 4096, 0),
            format!("Downloading {} model (4 KB)", ModelBundle::AgeGender)
        );
    }

    #[test]
    fn test_missing_models_report_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            model_source: ModelSource::Directory(dir.path().to_path_buf()),
            ..AppConfig::default()
        };
        let (rx, _cancel) = spawn(&config, ConfidenceThreshold::new(0.5));

        let message = rx.recv_timeout(Duration::from_secs(10)).unwrap();
        assert!(matches!(message, LoaderMessage::Failed(_)), "{message:?}");
    }
}

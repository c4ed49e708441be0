use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::export::domain::snapshot_encoder::Snapshot;
use crate::shared::constants::SNAPSHOT_FILENAME;

/// Writes the encoded snapshot, creating parent directories as needed.
pub fn save_snapshot(snapshot: &Snapshot, path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, &snapshot.bytes)?;
    log::info!("Saved snapshot to {}", path.display());
    Ok(())
}

/// `dir/face-detection.jpg`
pub fn default_download_path(dir: &Path) -> PathBuf {
    dir.join(SNAPSHOT_FILENAME)
}

/// The user's download directory, or the current directory when the
/// platform has none.
pub fn download_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
}

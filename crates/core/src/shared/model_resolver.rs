use std::fmt;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("model file not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("connection dropped while downloading {url}: {source}")]
    Stream {
        url: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// Fixed base location that every model bundle is loaded from.
///
/// Serialized as a plain string: anything starting with `http://` or
/// `https://` is a URL base, everything else is a directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ModelSource {
    Directory(PathBuf),
    Url(String),
}

impl From<String> for ModelSource {
    fn from(value: String) -> Self {
        if value.starts_with("http://") || value.starts_with("https://") {
            ModelSource::Url(value.trim_end_matches('/').to_string())
        } else {
            ModelSource::Directory(PathBuf::from(value))
        }
    }
}

impl From<&str> for ModelSource {
    fn from(value: &str) -> Self {
        ModelSource::from(value.to_string())
    }
}

impl From<ModelSource> for String {
    fn from(source: ModelSource) -> Self {
        source.to_string()
    }
}

impl fmt::Display for ModelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSource::Directory(dir) => write!(f, "{}", dir.display()),
            ModelSource::Url(url) => write!(f, "{url}"),
        }
    }
}

/// Resolve a model file by name against its source.
///
/// Directory sources must already contain the file. URL sources are
/// checked against the user cache first and downloaded into it otherwise.
pub fn resolve(
    name: &str,
    source: &ModelSource,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    match source {
        ModelSource::Directory(dir) => {
            let path = dir.join(name);
            if path.is_file() {
                Ok(path)
            } else {
                Err(ModelResolveError::NotFound(path))
            }
        }
        ModelSource::Url(base) => {
            let cache_dir = model_cache_dir()?;
            let cached_path = cache_dir.join(name);
            if cached_path.exists() {
                return Ok(cached_path);
            }

            fs::create_dir_all(&cache_dir).map_err(ModelResolveError::CacheDir)?;
            let url = format!("{base}/{name}");
            log::info!("Downloading {url}");
            download(&url, &cached_path, progress)?;
            Ok(cached_path)
        }
    }
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/facecam/models/`
/// - Linux: `$XDG_CACHE_HOME/facecam/models/` or `~/.cache/facecam/models/`
/// - Windows: `%LOCALAPPDATA%/facecam/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join("facecam").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join("facecam").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
}

fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let temp_path = dest.with_extension("part");
    let result = stream_to(url, dest, &temp_path, progress);
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

/// Streams the body into `temp_path` in 1 MB reads, reporting progress
/// after each one, then renames it onto `dest`.
fn stream_to(
    url: &str,
    dest: &Path,
    temp_path: &Path,
    progress: Option<ProgressFn>,
) -> Result<(), ModelResolveError> {
    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| ModelResolveError::Download {
            url: url.to_string(),
            source: e,
        })?;

    let total = response.content_length().unwrap_or(0);
    let mut downloaded: u64 = 0;

    let write_err = |e: std::io::Error| ModelResolveError::Write {
        path: temp_path.to_path_buf(),
        source: e,
    };
    let mut file = fs::File::create(temp_path).map_err(write_err)?;

    let mut buf = vec![0u8; 1024 * 1024];
    loop {
        let n = response.read(&mut buf).map_err(|e| ModelResolveError::Stream {
            url: url.to_string(),
            source: e,
        })?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n]).map_err(write_err)?;
        downloaded += n as u64;
        if let Some(ref cb) = progress {
            cb(downloaded, total);
        }
    }

    file.flush().map_err(write_err)?;
    drop(file);

    fs::rename(temp_path, dest).map_err(|e| ModelResolveError::Write {
        path: dest.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

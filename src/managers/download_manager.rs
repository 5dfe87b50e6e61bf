//! Download Manager for CyberBrowser.
//!
//! The rendering engine performs the transfer; this manager only picks a
//! non-colliding destination inside the configured directory and records the
//! outcome reported back by the engine.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{info, warn};
use url::Url;

use crate::types::download::{DownloadItem, DownloadStatus};
use crate::types::errors::DownloadError;

const FALLBACK_FILENAME: &str = "download";

/// Trait defining download management operations.
pub trait DownloadManagerTrait {
    fn prepare_download(&mut self, url: &str, suggested: Option<&Path>) -> Result<PathBuf, DownloadError>;
    fn complete_download(&mut self, url: &str, path: Option<&Path>, success: bool) -> Result<u64, DownloadError>;
    fn list_downloads(&self) -> Vec<&DownloadItem>;
    fn get_download(&self, id: u64) -> Option<&DownloadItem>;
    fn set_directory(&mut self, directory: PathBuf);
    fn directory(&self) -> &Path;
}

/// In-memory record of downloads started in this session.
pub struct DownloadManager {
    directory: PathBuf,
    downloads: Vec<DownloadItem>,
    next_id: u64,
}

impl DownloadManager {
    pub fn new(directory: PathBuf) -> Self {
        Self {
            directory,
            downloads: Vec::new(),
            next_id: 1,
        }
    }

    fn now_ts() -> i64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs() as i64
    }

    /// File name for a download: the engine's suggestion, else the last URL segment.
    pub fn filename_for(url: &str, suggested: Option<&Path>) -> String {
        let from_suggestion = suggested
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().to_string());
        let from_url = || {
            Url::parse(url).ok().and_then(|u| {
                u.path_segments()
                    .and_then(|mut segments| segments.next_back().map(str::to_string))
            })
        };

        let raw = from_suggestion
            .filter(|n| !n.is_empty())
            .or_else(from_url)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| FALLBACK_FILENAME.to_string());
        sanitize_filename(&raw)
    }

    /// First path in `dir` not already taken: `name.ext`, `name (1).ext`, ...
    fn unique_path(&self, dir: &Path, filename: &str) -> PathBuf {
        let candidate = dir.join(filename);
        if !self.is_taken(&candidate) {
            return candidate;
        }

        let (stem, ext) = match filename.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
            _ => (filename, None),
        };
        (1..)
            .map(|n| match ext {
                Some(ext) => dir.join(format!("{} ({}).{}", stem, n, ext)),
                None => dir.join(format!("{} ({})", stem, n)),
            })
            .find(|p| !self.is_taken(p))
            .unwrap_or(candidate)
    }

    fn is_taken(&self, path: &Path) -> bool {
        path.exists()
            || self
                .downloads
                .iter()
                .any(|d| d.status == DownloadStatus::InProgress && d.path == path)
    }
}

impl DownloadManagerTrait for DownloadManager {
    /// Chooses the destination for a download and records it as in progress.
    fn prepare_download(&mut self, url: &str, suggested: Option<&Path>) -> Result<PathBuf, DownloadError> {
        fs::create_dir_all(&self.directory)
            .map_err(|e| DownloadError::FileSystemError(e.to_string()))?;

        let filename = Self::filename_for(url, suggested);
        let path = self.unique_path(&self.directory.clone(), &filename);
        let id = self.next_id;
        self.next_id += 1;

        info!(id, url, path = %path.display(), "download started");
        self.downloads.push(DownloadItem {
            id,
            url: url.to_string(),
            filename: path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or(filename),
            path: path.clone(),
            status: DownloadStatus::InProgress,
            started_at: Self::now_ts(),
            completed_at: None,
        });
        Ok(path)
    }

    /// Marks the newest in-progress download for `url` as finished.
    fn complete_download(&mut self, url: &str, path: Option<&Path>, success: bool) -> Result<u64, DownloadError> {
        let item = self
            .downloads
            .iter_mut()
            .rev()
            .find(|d| d.url == url && d.status == DownloadStatus::InProgress)
            .ok_or(DownloadError::NotFound(0))?;

        item.status = if success {
            DownloadStatus::Completed
        } else {
            DownloadStatus::Failed
        };
        item.completed_at = Some(Self::now_ts());
        if let Some(p) = path {
            item.path = p.to_path_buf();
        }

        if success {
            info!(id = item.id, "download completed");
        } else {
            warn!(id = item.id, url, "download failed");
        }
        Ok(item.id)
    }

    fn list_downloads(&self) -> Vec<&DownloadItem> {
        self.downloads.iter().collect()
    }

    fn get_download(&self, id: u64) -> Option<&DownloadItem> {
        self.downloads.iter().find(|d| d.id == id)
    }

    fn set_directory(&mut self, directory: PathBuf) {
        self.directory = directory;
    }

    fn directory(&self) -> &Path {
        &self.directory
    }
}

/// Replaces path separators and control characters with `_`.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    match cleaned.trim_matches('.') {
        "" => FALLBACK_FILENAME.to_string(),
        _ => cleaned,
    }
}

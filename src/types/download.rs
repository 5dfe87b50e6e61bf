use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Status of a file download handed to the rendering engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DownloadStatus {
    InProgress,
    Completed,
    Failed,
}

/// A download with its chosen destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadItem {
    pub id: u64,
    pub url: String,
    pub filename: String,
    pub path: PathBuf,
    pub status: DownloadStatus,
    pub started_at: i64,
    pub completed_at: Option<i64>,
}

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use super::tab::TabId;

// === TabError ===

/// Errors related to tab registry operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabError {
    /// The position is outside the tab strip.
    PositionOutOfRange { position: usize, len: usize },
    /// No tab carries the given identity.
    UnknownIdentity(TabId),
}

impl fmt::Display for TabError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TabError::PositionOutOfRange { position, len } => {
                write!(f, "Tab position {} out of range ({} tabs)", position, len)
            }
            TabError::UnknownIdentity(id) => write!(f, "Unknown tab identity: {}", id),
        }
    }
}

impl std::error::Error for TabError {}

// === ProxyError ===

/// Errors reported by the Tor proxy supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyError {
    /// No executable directory has been configured.
    ConfigurationMissing,
    /// No usable `tor` binary exists in the configured directory.
    ExecutableNotFound(PathBuf),
    /// The per-user data directory could not be prepared.
    DataDirectory(String),
    /// The process could not be spawned.
    SpawnFailed(String),
    /// The SOCKS port did not accept connections in time.
    StartupTimeout(Duration),
    /// The process exited before the SOCKS port came up.
    ExitedDuringStartup(String),
    /// The start was cancelled by a stop request.
    Cancelled,
}

impl fmt::Display for ProxyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyError::ConfigurationMissing => {
                write!(f, "Tor executable directory is not configured")
            }
            ProxyError::ExecutableNotFound(dir) => {
                write!(f, "Tor executable not found in {}", dir.display())
            }
            ProxyError::DataDirectory(msg) => write!(f, "Tor data directory error: {}", msg),
            ProxyError::SpawnFailed(msg) => write!(f, "Failed to launch Tor: {}", msg),
            ProxyError::StartupTimeout(timeout) => write!(
                f,
                "Tor did not open its SOCKS port within {} seconds",
                timeout.as_secs()
            ),
            ProxyError::ExitedDuringStartup(status) => {
                write!(f, "Tor exited during startup: {}", status)
            }
            ProxyError::Cancelled => write!(f, "Tor startup cancelled"),
        }
    }
}

impl std::error::Error for ProxyError {}

// === DownloadError ===

/// Errors related to download handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadError {
    /// Download with the given ID was not found.
    NotFound(u64),
    /// A file system error occurred.
    FileSystemError(String),
}

impl fmt::Display for DownloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadError::NotFound(id) => write!(f, "Download not found: {}", id),
            DownloadError::FileSystemError(msg) => {
                write!(f, "Download file system error: {}", msg)
            }
        }
    }
}

impl std::error::Error for DownloadError {}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    IoError(String),
    /// Failed to serialize or deserialize settings.
    SerializationError(String),
    /// The provided settings key is invalid.
    InvalidKey(String),
    /// The provided settings value is invalid.
    InvalidValue(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::IoError(msg) => write!(f, "Settings I/O error: {}", msg),
            SettingsError::SerializationError(msg) => {
                write!(f, "Settings serialization error: {}", msg)
            }
            SettingsError::InvalidKey(key) => write!(f, "Invalid settings key: {}", key),
            SettingsError::InvalidValue(msg) => {
                write!(f, "Invalid settings value: {}", msg)
            }
        }
    }
}

impl std::error::Error for SettingsError {}

// === AppError ===

/// Errors surfaced by the application core to the hosting window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    Tab(TabError),
    Proxy(ProxyError),
    Settings(SettingsError),
    Download(DownloadError),
    /// No tab is selected.
    NoSelection,
    /// The background proxy runtime could not be created.
    Runtime(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Tab(e) => write!(f, "{}", e),
            AppError::Proxy(e) => write!(f, "{}", e),
            AppError::Settings(e) => write!(f, "{}", e),
            AppError::Download(e) => write!(f, "{}", e),
            AppError::NoSelection => write!(f, "No tab is selected"),
            AppError::Runtime(msg) => write!(f, "Failed to start background runtime: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Tab(e) => Some(e),
            AppError::Proxy(e) => Some(e),
            AppError::Settings(e) => Some(e),
            AppError::Download(e) => Some(e),
            AppError::NoSelection | AppError::Runtime(_) => None,
        }
    }
}

impl From<TabError> for AppError {
    fn from(e: TabError) -> Self {
        AppError::Tab(e)
    }
}

impl From<ProxyError> for AppError {
    fn from(e: ProxyError) -> Self {
        AppError::Proxy(e)
    }
}

impl From<SettingsError> for AppError {
    fn from(e: SettingsError) -> Self {
        AppError::Settings(e)
    }
}

impl From<DownloadError> for AppError {
    fn from(e: DownloadError) -> Self {
        AppError::Download(e)
    }
}

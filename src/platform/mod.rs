// CyberBrowser platform abstraction
// Provides platform-specific paths and the Tor binary names for Windows, macOS, and Linux.
//
// Uses `cfg(target_os)` for conditional compilation to select the correct
// platform-specific implementation at compile time.

use std::path::{Path, PathBuf};

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
use linux as imp;

#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "macos")]
use macos as imp;

#[cfg(target_os = "windows")]
mod windows;
#[cfg(target_os = "windows")]
use windows as imp;

/// Returns the platform-specific configuration directory for CyberBrowser.
///
/// - **Linux**: `~/.config/cyberbrowser` (or `$XDG_CONFIG_HOME/cyberbrowser`)
/// - **macOS**: `~/Library/Application Support/CyberBrowser`
/// - **Windows**: `%APPDATA%/CyberBrowser`
pub fn get_config_dir() -> PathBuf {
    imp::get_config_dir()
}

/// Returns the platform-specific data directory for CyberBrowser.
///
/// - **Linux**: `~/.local/share/cyberbrowser` (or `$XDG_DATA_HOME/cyberbrowser`)
/// - **macOS**: `~/Library/Application Support/CyberBrowser`
/// - **Windows**: `%LOCALAPPDATA%/CyberBrowser`
pub fn get_data_dir() -> PathBuf {
    imp::get_data_dir()
}

/// Returns the default directory downloads are saved into.
pub fn get_download_dir() -> PathBuf {
    imp::get_download_dir()
}

/// Tor's own state directory inside the given data directory.
pub fn tor_data_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("tor")
}

/// Tor binary names probed inside the configured executable directory, in order.
pub fn proxy_executable_names() -> &'static [&'static str] {
    imp::PROXY_EXECUTABLE_NAMES
}

/// Whether `path` is a regular file the current user may execute.
pub fn is_executable(path: &Path) -> bool {
    let Ok(meta) = std::fs::metadata(path) else {
        return false;
    };
    if !meta.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        meta.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}

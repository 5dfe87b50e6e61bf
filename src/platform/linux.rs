// CyberBrowser platform paths for Linux
// Config:    ~/.config/cyberbrowser
// Data:      ~/.local/share/cyberbrowser
// Downloads: ~/Downloads

use std::env;
use std::path::PathBuf;

/// Candidate Tor binaries, relative to the configured executable directory.
pub const PROXY_EXECUTABLE_NAMES: &[&str] = &["tor", "Tor/tor"];

fn home_dir() -> PathBuf {
    PathBuf::from(env::var("HOME").unwrap_or_else(|_| String::from("/tmp")))
}

/// Uses `$XDG_CONFIG_HOME/cyberbrowser` if set, otherwise `~/.config/cyberbrowser`.
pub fn get_config_dir() -> PathBuf {
    match env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg).join("cyberbrowser"),
        _ => home_dir().join(".config").join("cyberbrowser"),
    }
}

/// Uses `$XDG_DATA_HOME/cyberbrowser` if set, otherwise `~/.local/share/cyberbrowser`.
pub fn get_data_dir() -> PathBuf {
    match env::var("XDG_DATA_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg).join("cyberbrowser"),
        _ => home_dir().join(".local").join("share").join("cyberbrowser"),
    }
}

/// Uses `$XDG_DOWNLOAD_DIR` if set, otherwise `~/Downloads`.
pub fn get_download_dir() -> PathBuf {
    match env::var("XDG_DOWNLOAD_DIR") {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => home_dir().join("Downloads"),
    }
}

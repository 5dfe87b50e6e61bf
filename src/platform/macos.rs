// CyberBrowser platform paths for macOS
// Config:    ~/Library/Application Support/CyberBrowser
// Data:      ~/Library/Application Support/CyberBrowser
// Downloads: ~/Downloads

use std::env;
use std::path::PathBuf;

/// Candidate Tor binaries, relative to the configured executable directory.
pub const PROXY_EXECUTABLE_NAMES: &[&str] = &["tor", "Tor/tor"];

fn home_dir() -> PathBuf {
    PathBuf::from(env::var("HOME").unwrap_or_else(|_| String::from("/tmp")))
}

/// `~/Library/Application Support/CyberBrowser`
pub fn get_config_dir() -> PathBuf {
    home_dir()
        .join("Library")
        .join("Application Support")
        .join("CyberBrowser")
}

/// `~/Library/Application Support/CyberBrowser`
pub fn get_data_dir() -> PathBuf {
    get_config_dir()
}

pub fn get_download_dir() -> PathBuf {
    home_dir().join("Downloads")
}

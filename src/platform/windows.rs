// CyberBrowser platform paths for Windows
// Config:    %APPDATA%/CyberBrowser
// Data:      %LOCALAPPDATA%/CyberBrowser
// Downloads: %USERPROFILE%/Downloads

use std::env;
use std::path::PathBuf;

/// Candidate Tor binaries, relative to the configured executable directory.
pub const PROXY_EXECUTABLE_NAMES: &[&str] = &["tor.exe", "Tor\\tor.exe"];

/// `%APPDATA%/CyberBrowser`
pub fn get_config_dir() -> PathBuf {
    let appdata =
        env::var("APPDATA").unwrap_or_else(|_| String::from("C:\\Users\\Default\\AppData\\Roaming"));
    PathBuf::from(appdata).join("CyberBrowser")
}

/// `%LOCALAPPDATA%/CyberBrowser`
pub fn get_data_dir() -> PathBuf {
    let local_appdata = env::var("LOCALAPPDATA")
        .unwrap_or_else(|_| String::from("C:\\Users\\Default\\AppData\\Local"));
    PathBuf::from(local_appdata).join("CyberBrowser")
}

/// `%USERPROFILE%/Downloads`
pub fn get_download_dir() -> PathBuf {
    let profile =
        env::var("USERPROFILE").unwrap_or_else(|_| String::from("C:\\Users\\Default"));
    PathBuf::from(profile).join("Downloads")
}

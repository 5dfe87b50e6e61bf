use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::proxy::{DEFAULT_CONTROL_PORT, DEFAULT_SOCKS_PORT};

/// Placeholder substituted with the encoded query in search templates.
pub const QUERY_PLACEHOLDER: &str = "{}";
pub const FALLBACK_SEARCH_ENGINE: &str = "duckduckgo";
pub const FALLBACK_SEARCH_TEMPLATE: &str = "https://duckduckgo.com/?q={}";

/// Top-level browser settings container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct BrowserSettings {
    pub general: GeneralSettings,
    pub search: SearchSettings,
    pub proxy: ProxySettings,
    pub content: ContentSettings,
    pub window: WindowGeometry,
    pub downloads: DownloadSettings,
}

/// General browser settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneralSettings {
    /// Opened by the home view's "Start" button and by an empty search.
    pub homepage: String,
    pub default_search_engine: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            homepage: "https://duckduckgo.com".to_string(),
            default_search_engine: FALLBACK_SEARCH_ENGINE.to_string(),
        }
    }
}

/// Search engine URL templates, keyed by engine name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchSettings {
    pub engines: BTreeMap<String, String>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self { engines: Self::default_engines() }
    }
}

impl SearchSettings {
    /// Returns the built-in search engine templates.
    pub fn default_engines() -> BTreeMap<String, String> {
        let mut engines = BTreeMap::new();
        engines.insert("duckduckgo".to_string(), FALLBACK_SEARCH_TEMPLATE.to_string());
        engines.insert("google".to_string(), "https://www.google.com/search?q={}".to_string());
        engines.insert("bing".to_string(), "https://www.bing.com/search?q={}".to_string());
        engines.insert("startpage".to_string(), "https://www.startpage.com/do/search?q={}".to_string());
        engines
    }
}

/// Tor proxy settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProxySettings {
    /// Directory containing the `tor` executable.
    pub executable_dir: Option<PathBuf>,
    pub enabled: bool,
    pub socks_port: u16,
    pub control_port: u16,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            executable_dir: None,
            enabled: false,
            socks_port: DEFAULT_SOCKS_PORT,
            control_port: DEFAULT_CONTROL_PORT,
        }
    }
}

/// Content policies applied to newly created page views.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ContentSettings {
    pub autoplay: bool,
    pub incognito: bool,
    pub block_popups: bool,
}

impl Default for ContentSettings {
    fn default() -> Self {
        Self {
            autoplay: false,
            incognito: true,
            block_popups: true,
        }
    }
}

/// Window position and size, persisted on shutdown.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowGeometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowGeometry {
    fn default() -> Self {
        Self {
            x: 100,
            y: 100,
            width: 1400,
            height: 900,
        }
    }
}

/// Download destination settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct DownloadSettings {
    /// `None` uses the platform Downloads directory.
    pub directory: Option<PathBuf>,
}

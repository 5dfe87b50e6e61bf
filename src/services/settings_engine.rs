// CyberBrowser Settings Engine
// Manages user settings: loading, saving, updating individual values, and resetting to defaults.
// Settings are stored as a JSON file at the platform-specific config path. A missing or corrupt
// file is replaced by the built-in defaults.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{info, warn};

use crate::platform;
use crate::types::errors::SettingsError;
use crate::types::settings::{BrowserSettings, WindowGeometry, FALLBACK_SEARCH_TEMPLATE};

/// Trait defining the settings engine interface.
pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<BrowserSettings, SettingsError>;
    fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &BrowserSettings;
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError>;
    fn reset(&mut self) -> Result<(), SettingsError>;
    fn get_config_path(&self) -> &str;
    fn search_template(&self, engine: &str) -> &str;
    fn set_window_geometry(&mut self, geometry: WindowGeometry) -> Result<(), SettingsError>;
}

/// Settings engine implementation that persists settings as JSON on disk.
pub struct SettingsEngine {
    config_path: String,
    settings: BrowserSettings,
}

impl SettingsEngine {
    /// Creates a new SettingsEngine.
    ///
    /// If `path_override` is `Some`, uses that path for the config file.
    /// Otherwise, uses the platform-specific config directory with `settings.json`.
    pub fn new(path_override: Option<String>) -> Self {
        let config_path = match path_override {
            Some(p) => p,
            None => platform::get_config_dir()
                .join("settings.json")
                .to_string_lossy()
                .to_string(),
        };

        Self {
            config_path,
            settings: BrowserSettings::default(),
        }
    }

    /// Template for the configured default search engine.
    pub fn default_search_template(&self) -> &str {
        self.search_template(&self.settings.general.default_search_engine)
    }

    fn restore_defaults(&mut self) -> Result<BrowserSettings, SettingsError> {
        self.settings = BrowserSettings::default();
        self.save()?;
        Ok(self.settings.clone())
    }
}

impl SettingsEngineTrait for SettingsEngine {
    /// Loads settings from the JSON config file.
    ///
    /// A missing file is created with defaults. A file that fails to parse is
    /// overwritten with defaults and a warning is logged.
    fn load(&mut self) -> Result<BrowserSettings, SettingsError> {
        let path = Path::new(&self.config_path);

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.config_path, "no settings file, writing defaults");
                return self.restore_defaults();
            }
            Err(e) => {
                return Err(SettingsError::IoError(format!(
                    "Failed to read config file: {}",
                    e
                )))
            }
        };

        match serde_json::from_str::<BrowserSettings>(&content) {
            Ok(settings) => {
                self.settings = settings;
                Ok(self.settings.clone())
            }
            Err(e) => {
                warn!(path = %self.config_path, error = %e, "corrupt settings file, restoring defaults");
                self.restore_defaults()
            }
        }
    }

    /// Saves the current settings to the JSON config file.
    ///
    /// Creates parent directories if they don't exist.
    fn save(&self) -> Result<(), SettingsError> {
        let path = Path::new(&self.config_path);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SettingsError::IoError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;

        fs::write(path, json)
            .map_err(|e| SettingsError::IoError(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    fn get_settings(&self) -> &BrowserSettings {
        &self.settings
    }

    /// Updates an individual setting by dot-notation key path.
    ///
    /// Converts the current settings to a `serde_json::Value`, navigates the
    /// dot-separated key path, updates the target value, then deserializes
    /// back into `BrowserSettings`. Saves to disk after a successful update.
    ///
    /// # Examples
    /// - `"general.default_search_engine"` → updates `settings.general.default_search_engine`
    /// - `"proxy.executable_dir"` → updates `settings.proxy.executable_dir`
    /// - `"search.engines.google"` → updates one engine template
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError> {
        if key.is_empty() {
            return Err(SettingsError::InvalidKey("Key cannot be empty".to_string()));
        }

        let parts: Vec<&str> = key.split('.').collect();

        let mut json_value = serde_json::to_value(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;

        {
            let mut current = &mut json_value;
            for (i, part) in parts.iter().enumerate() {
                if i == parts.len() - 1 {
                    match current {
                        serde_json::Value::Object(map) => {
                            // Engine templates are an open map; everything else must exist.
                            let open_map = parts.len() == 3 && parts[0] == "search" && parts[1] == "engines";
                            if !open_map && !map.contains_key(*part) {
                                return Err(SettingsError::InvalidKey(format!(
                                    "Key '{}' not found in settings",
                                    key
                                )));
                            }
                            map.insert(part.to_string(), value.clone());
                        }
                        _ => {
                            return Err(SettingsError::InvalidKey(format!(
                                "Cannot navigate to key '{}': intermediate value is not an object",
                                key
                            )));
                        }
                    }
                } else {
                    current = match current.get_mut(*part) {
                        Some(v) => v,
                        None => {
                            return Err(SettingsError::InvalidKey(format!(
                                "Key '{}' not found in settings",
                                key
                            )));
                        }
                    };
                }
            }
        }

        let new_settings: BrowserSettings = serde_json::from_value(json_value).map_err(|e| {
            SettingsError::InvalidValue(format!("Invalid value for key '{}': {}", key, e))
        })?;

        self.settings = new_settings;
        self.save()?;

        Ok(())
    }

    /// Resets all settings to factory defaults and saves to disk.
    fn reset(&mut self) -> Result<(), SettingsError> {
        self.restore_defaults().map(|_| ())
    }

    fn get_config_path(&self) -> &str {
        &self.config_path
    }

    /// Template for `engine`, falling back to DuckDuckGo for unknown names.
    fn search_template(&self, engine: &str) -> &str {
        match self.settings.search.engines.get(engine) {
            Some(template) => template,
            None => {
                warn!(engine, "unknown search engine, using fallback");
                FALLBACK_SEARCH_TEMPLATE
            }
        }
    }

    fn set_window_geometry(&mut self, geometry: WindowGeometry) -> Result<(), SettingsError> {
        self.settings.window = geometry;
        self.save()
    }
}

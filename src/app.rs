//! App Core for CyberBrowser.
//!
//! Central struct holding the tab registry, settings, proxy controller and
//! download manager. Every method runs on the thread that owns the window (or
//! the RPC loop); proxy work happens elsewhere and comes back through the
//! status channel drained by [`App::poll_proxy_status`].

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{error, info, warn};

use crate::managers::download_manager::{DownloadManager, DownloadManagerTrait};
use crate::managers::tab_registry::{TabRegistry, TabRegistryTrait};
use crate::platform;
use crate::services::proxy_controller::ProxyController;
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::services::url_resolver;
use crate::types::errors::AppError;
use crate::types::proxy::{ProxyConfig, ProxyStatus};
use crate::types::settings::{BrowserSettings, WindowGeometry};
use crate::types::tab::{NewTabKind, Promotion, TabId, TabSnapshot};

/// Called after a proxy status has been queued, so an event loop can wake up.
pub type StatusWaker = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A short message for the status area of the window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }
}

/// A URL the window should load into `tab`. `promoted` means the tab just left
/// the home view and needs a page view of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Navigation {
    pub tab: TabId,
    pub url: String,
    pub promoted: bool,
}

pub struct App {
    pub tabs: TabRegistry,
    pub settings_engine: SettingsEngine,
    pub proxy: ProxyController,
    pub download_manager: DownloadManager,
    proxy_status: ProxyStatus,
    // Bumped on every start/stop request; statuses from older requests are dropped.
    proxy_generation: u64,
    status_tx: Sender<(u64, ProxyStatus)>,
    status_rx: Receiver<(u64, ProxyStatus)>,
    waker: Option<StatusWaker>,
}

impl App {
    /// Creates an App using `config_path` (or the platform default) for
    /// settings and `data_dir` for the Tor data directory.
    pub fn new(config_path: Option<String>, data_dir: PathBuf) -> Result<Self, AppError> {
        Self::with_proxy_config(config_path, ProxyConfig::new(None, data_dir))
    }

    /// Like [`App::new`] with explicit proxy timings and ports.
    pub fn with_proxy_config(
        config_path: Option<String>,
        proxy_config: ProxyConfig,
    ) -> Result<Self, AppError> {
        let proxy = ProxyController::new(proxy_config).map_err(|e| AppError::Runtime(e.to_string()))?;
        let (status_tx, status_rx) = mpsc::channel();

        Ok(Self {
            tabs: TabRegistry::new(),
            settings_engine: SettingsEngine::new(config_path),
            proxy,
            download_manager: DownloadManager::new(platform::get_download_dir()),
            proxy_status: ProxyStatus::stopped("Tor is not running"),
            proxy_generation: 0,
            status_tx,
            status_rx,
            waker: None,
        })
    }

    /// Registers a callback invoked from the proxy thread whenever a status is queued.
    pub fn set_status_waker(&mut self, waker: StatusWaker) {
        self.waker = Some(waker);
    }

    /// Startup sequence: load settings, configure the proxy and downloads,
    /// open the first Home tab, and start Tor if it was left enabled.
    pub fn startup(&mut self) {
        if let Err(e) = self.settings_engine.load() {
            error!(error = %e, "failed to load settings, using defaults");
        }
        self.sync_proxy_config();
        self.sync_download_dir();

        if self.tabs.tab_count() == 0 {
            self.tabs.create_tab(NewTabKind::Home);
        }

        if self.settings().proxy.enabled {
            info!("tor was enabled last session, starting");
            self.request_proxy(true);
        }
        info!(config = %self.settings_engine.get_config_path(), "startup complete");
    }

    pub fn settings(&self) -> &BrowserSettings {
        self.settings_engine.get_settings()
    }

    pub fn tab_snapshots(&self) -> Vec<TabSnapshot> {
        self.tabs.snapshots()
    }

    // === Tabs ===

    pub fn new_tab(&mut self) -> TabId {
        let id = self.tabs.create_tab(NewTabKind::Placeholder);
        info!(tab = %id, "new tab");
        id
    }

    pub fn select_position(&mut self, position: usize) -> Result<TabId, AppError> {
        let id = self.tabs.select_position(position)?;
        info!(tab = %id, position, "selected tab");
        Ok(id)
    }

    pub fn move_tab(&mut self, from: usize, to: usize) -> Result<(), AppError> {
        self.tabs.move_tab(from, to)?;
        info!(from, to, "moved tab");
        Ok(())
    }

    /// Resolves search-box input and loads it into the selected tab. Empty
    /// input opens the homepage.
    pub fn submit_search(&mut self, input: &str) -> Result<Navigation, AppError> {
        let id = self.tabs.selected().ok_or(AppError::NoSelection)?;
        let template = self.settings_engine.default_search_template();
        let url = url_resolver::resolve_input(input, template)
            .into_url()
            .unwrap_or_else(|| self.settings().general.homepage.clone());
        self.navigate(id, url)
    }

    /// The home view's "Start" button.
    pub fn open_homepage(&mut self) -> Result<Navigation, AppError> {
        let id = self.tabs.selected().ok_or(AppError::NoSelection)?;
        let url = self.settings().general.homepage.clone();
        self.navigate(id, url)
    }

    fn navigate(&mut self, id: TabId, url: String) -> Result<Navigation, AppError> {
        let outcome = self.tabs.promote(id, &url, "")?;
        info!(tab = %id, url = %url, "navigate");
        Ok(Navigation {
            tab: id,
            url,
            promoted: outcome == Promotion::Promoted,
        })
    }

    /// Page title reported by the rendering engine. Blank titles are ignored.
    pub fn on_title_changed(&mut self, id: TabId, title: &str) -> bool {
        let title = title.trim();
        if title.is_empty() {
            return false;
        }
        self.tabs.update_title(id, title)
    }

    /// Page load outcome for one tab. Failures only concern that tab.
    pub fn on_load_finished(&mut self, id: TabId, ok: bool) -> Option<Notice> {
        if ok {
            return None;
        }
        let url = self
            .tabs
            .get_tab(id)
            .and_then(|t| t.content.url().map(str::to_string))
            .unwrap_or_default();
        warn!(tab = %id, url = %url, "page failed to load");
        Some(Notice::error(format!("Failed to load {}", url)))
    }

    // === Proxy ===

    /// Persists the toggle and asks the controller to start or stop Tor. The
    /// outcome arrives later through [`App::poll_proxy_status`].
    pub fn set_proxy_enabled(&mut self, enabled: bool) -> Result<(), AppError> {
        self.settings_engine
            .set_value("proxy.enabled", serde_json::Value::Bool(enabled))?;
        self.request_proxy(enabled);
        Ok(())
    }

    fn request_proxy(&mut self, enabled: bool) {
        self.sync_proxy_config();
        self.proxy_generation += 1;

        let generation = self.proxy_generation;
        let tx = self.status_tx.clone();
        let waker = self.waker.clone();
        let notify = move |status: ProxyStatus| {
            if tx.send((generation, status)).is_ok() {
                if let Some(wake) = waker {
                    wake();
                }
            }
        };

        if enabled {
            self.proxy.request_start(notify);
        } else {
            self.proxy.request_stop(notify);
        }
    }

    /// Records a status from the controller. A failed start while the toggle
    /// is on turns the toggle back off and is always reported. Repeats of a
    /// running status yield nothing.
    pub fn apply_proxy_status(&mut self, status: ProxyStatus) -> Option<Notice> {
        if status.running && status == self.proxy_status {
            return None;
        }
        self.proxy_status = status.clone();

        if status.running {
            info!(reason = %status.reason, "tor running");
            return Some(Notice::info(status.reason));
        }
        if self.settings().proxy.enabled {
            warn!(reason = %status.reason, "tor failed to start, disabling");
            if let Err(e) = self
                .settings_engine
                .set_value("proxy.enabled", serde_json::Value::Bool(false))
            {
                warn!(error = %e, "failed to persist proxy toggle");
            }
            return Some(Notice::error(status.reason));
        }
        info!(reason = %status.reason, "tor stopped");
        Some(Notice::info(status.reason))
    }

    /// Applies every queued status from the latest request.
    pub fn poll_proxy_status(&mut self) -> Vec<Notice> {
        let mut notices = Vec::new();
        while let Ok((generation, status)) = self.status_rx.try_recv() {
            if generation != self.proxy_generation {
                continue;
            }
            notices.extend(self.apply_proxy_status(status));
        }
        notices
    }

    /// Blocks until the latest request reports back or `timeout` elapses.
    pub fn wait_proxy_status(&mut self, timeout: Duration) -> Option<ProxyStatus> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.checked_duration_since(Instant::now())?;
            match self.status_rx.recv_timeout(remaining) {
                Ok((generation, status)) if generation == self.proxy_generation => {
                    self.apply_proxy_status(status);
                    return Some(self.proxy_status.clone());
                }
                Ok(_) => continue,
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    pub fn proxy_status(&self) -> &ProxyStatus {
        &self.proxy_status
    }

    pub fn is_proxy_running(&self) -> bool {
        self.proxy_status.running
    }

    /// `socks5://127.0.0.1:<port>` while Tor is up.
    pub fn proxy_url(&self) -> Option<String> {
        self.proxy_status
            .running
            .then(|| format!("socks5://127.0.0.1:{}", self.proxy.socks_port()))
    }

    fn sync_proxy_config(&mut self) {
        let proxy = self.settings_engine.get_settings().proxy.clone();
        self.proxy.set_executable_dir(proxy.executable_dir);
        self.proxy.set_ports(proxy.socks_port, proxy.control_port);
    }

    fn sync_download_dir(&mut self) {
        let dir = self
            .settings()
            .downloads
            .directory
            .clone()
            .unwrap_or_else(platform::get_download_dir);
        self.download_manager.set_directory(dir);
    }

    // === Settings ===

    /// Persists one setting and forwards it to the component that uses it.
    pub fn update_setting(&mut self, key: &str, value: serde_json::Value) -> Result<(), AppError> {
        if key == "proxy.enabled" {
            let enabled = value.as_bool().ok_or_else(|| {
                crate::types::errors::SettingsError::InvalidValue(format!(
                    "Invalid value for key '{}': expected a boolean",
                    key
                ))
            })?;
            return self.set_proxy_enabled(enabled);
        }

        self.settings_engine.set_value(key, value)?;
        if key.starts_with("proxy.") {
            self.sync_proxy_config();
        } else if key.starts_with("downloads.") {
            self.sync_download_dir();
        }
        info!(key, "setting updated");
        Ok(())
    }

    // === Downloads ===

    pub fn prepare_download(&mut self, url: &str, suggested: Option<&Path>) -> Result<PathBuf, AppError> {
        Ok(self.download_manager.prepare_download(url, suggested)?)
    }

    pub fn complete_download(
        &mut self,
        url: &str,
        path: Option<&Path>,
        success: bool,
    ) -> Result<Notice, AppError> {
        let id = self.download_manager.complete_download(url, path, success)?;
        let name = self
            .download_manager
            .get_download(id)
            .map(|d| d.filename.clone())
            .unwrap_or_default();
        Ok(if success {
            Notice::info(format!("Downloaded {}", name))
        } else {
            Notice::error(format!("Download failed: {}", name))
        })
    }

    /// Shutdown sequence: stop Tor and persist the window geometry.
    pub fn shutdown(&mut self, geometry: Option<WindowGeometry>) {
        self.proxy.stop_blocking();
        self.proxy_status = ProxyStatus::stopped("Tor stopped");
        if let Some(geometry) = geometry {
            if let Err(e) = self.settings_engine.set_window_geometry(geometry) {
                warn!(error = %e, "failed to save window geometry");
            }
        }
        info!("shutdown complete");
    }
}

//! WebView-based browser window using `wry` + `tao`.
//!
//! Architecture:
//! - One tao window hosting child webviews positioned with `set_bounds`.
//! - The chrome view (tab strip + settings panel) and the shared home view are
//!   internal pages served from the `cyber://` custom protocol.
//! - Each live tab gets its own content view, built lazily when first shown,
//!   carrying the current SOCKS proxy and content policies. Proxy changes
//!   throw the content views away so the next show rebuilds them.
//! - IPC from JS → Rust via `window.ipc.postMessage()`, forwarded to the
//!   event loop as user events; Rust → JS via `evaluate_script`.
//!
//! Child webviews need X11 on Linux.

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tao::event::{Event, WindowEvent};
use tao::event_loop::{ControlFlow, EventLoop, EventLoopBuilder, EventLoopProxy};
use tao::window::{Window, WindowBuilder};
use tracing::{debug, info, warn};
use wry::dpi::{LogicalPosition, LogicalSize};
use wry::{PageLoadEvent, Rect, WebView, WebViewBuilder};

use crate::app::{App, Navigation, Notice};
use crate::managers::tab_registry::TabRegistryTrait;
use crate::platform;
use crate::types::settings::WindowGeometry;
use crate::types::tab::TabId;

const PROTOCOL: &str = "cyber";
const CHROME_URL: &str = "cyber://localhost/chrome";
const HOME_URL: &str = "cyber://localhost/home";
const CHROME_HEIGHT: f64 = 40.0;

const CHROME_HTML: &str = include_str!("../../resources/ui/chrome.html");
const HOME_HTML: &str = include_str!("../../resources/ui/home.html");

#[derive(Debug)]
enum UserEvent {
    /// Raw IPC body from the chrome or home view.
    Ipc(String),
    TitleChanged(TabId, String),
    PageLoaded(TabId),
    /// A pop-up request that is loaded into the requesting tab instead.
    OpenInTab(TabId, String),
    Notice(Notice),
    ProxyStatusReady,
}

struct BrowserState {
    app: App,
    settings_open: bool,
}

/// The window and its webviews. Lives inside the event loop closure.
struct Shell {
    window: Window,
    chrome: WebView,
    home: WebView,
    content: HashMap<TabId, WebView>,
    proxy: EventLoopProxy<UserEvent>,
    state: Arc<Mutex<BrowserState>>,
}

// ─── Internal pages ───

fn serve_internal(path: &str) -> wry::http::Response<Cow<'static, [u8]>> {
    let (status, body) = match path {
        "/chrome" => (200, CHROME_HTML),
        "/home" | "/" => (200, HOME_HTML),
        _ => (404, "Not found"),
    };
    wry::http::Response::builder()
        .status(status)
        .header("Content-Type", "text/html; charset=utf-8")
        .body(Cow::Borrowed(body.as_bytes()))
        .unwrap_or_else(|_| wry::http::Response::new(Cow::Borrowed(&[][..])))
}

fn ipc_forwarder(proxy: EventLoopProxy<UserEvent>) -> impl Fn(wry::http::Request<String>) + 'static {
    move |request| {
        let _ = proxy.send_event(UserEvent::Ipc(request.into_body()));
    }
}

// ─── Layout ───

fn logical_size(window: &Window) -> (f64, f64) {
    let size = window.inner_size().to_logical::<f64>(window.scale_factor());
    (size.width, size.height)
}

fn rect(x: f64, y: f64, width: f64, height: f64) -> Rect {
    Rect {
        position: LogicalPosition::new(x, y).into(),
        size: LogicalSize::new(width.max(0.0), height.max(0.0)).into(),
    }
}

fn chrome_rect(window: &Window, settings_open: bool) -> Rect {
    let (width, height) = logical_size(window);
    rect(0.0, 0.0, width, if settings_open { height } else { CHROME_HEIGHT })
}

fn content_rect(window: &Window) -> Rect {
    let (width, height) = logical_size(window);
    rect(0.0, CHROME_HEIGHT, width, height - CHROME_HEIGHT)
}

fn window_geometry(window: &Window) -> WindowGeometry {
    let scale = window.scale_factor();
    let size = window.inner_size().to_logical::<f64>(scale);
    let mut geometry = WindowGeometry {
        width: size.width.round() as u32,
        height: size.height.round() as u32,
        ..WindowGeometry::default()
    };
    if let Ok(position) = window.outer_position() {
        let position = position.to_logical::<f64>(scale);
        geometry.x = position.x.round() as i32;
        geometry.y = position.y.round() as i32;
    }
    geometry
}

fn script_call(function: &str, value: &impl serde::Serialize) -> String {
    let json = serde_json::to_string(value).unwrap_or_else(|_| "null".to_string());
    format!("if(window.{f})window.{f}({j})", f = function, j = json)
}

impl Shell {
    fn layout(&self, s: &BrowserState) {
        let _ = self.chrome.set_bounds(chrome_rect(&self.window, s.settings_open));
        let area = content_rect(&self.window);
        let _ = self.home.set_bounds(area);
        for view in self.content.values() {
            let _ = view.set_bounds(area);
        }
    }

    fn notify(&self, notice: &Notice) {
        let _ = self.chrome.evaluate_script(&script_call("__cb_notice", notice));
    }

    fn sync_chrome(&self, s: &BrowserState) {
        let status = s.app.proxy_status();
        let data = serde_json::json!({
            "tabs": s.app.tab_snapshots(),
            "affordance": s.app.tabs.affordance_position(),
            "proxy": {"running": status.running, "reason": status.reason},
        });
        let _ = self.chrome.evaluate_script(&script_call("__cb_render", &data));
    }

    fn sync_home(&self, s: &BrowserState) {
        let status = s.app.proxy_status();
        let data = serde_json::json!({
            "enabled": s.app.settings().proxy.enabled,
            "running": status.running,
            "reason": status.reason,
        });
        let _ = self.home.evaluate_script(&script_call("__cb_proxy", &data));
    }

    fn sync_settings(&self, s: &BrowserState) {
        let _ = self
            .chrome
            .evaluate_script(&script_call("__cb_settings", s.app.settings()));
    }

    /// Builds a page view for a live tab with the current proxy and content policies.
    fn build_content_view(&self, s: &BrowserState, id: TabId, url: &str) -> Result<WebView, wry::Error> {
        let content = s.app.settings().content.clone();
        let title_proxy = self.proxy.clone();
        let load_proxy = self.proxy.clone();
        let popup_proxy = self.proxy.clone();
        let done_proxy = self.proxy.clone();
        let start_state = Arc::clone(&self.state);
        let done_state = Arc::clone(&self.state);

        let mut builder = WebViewBuilder::new()
            .with_url(url)
            .with_bounds(content_rect(&self.window))
            .with_autoplay(content.autoplay)
            .with_incognito(content.incognito)
            .with_devtools(cfg!(debug_assertions))
            .with_document_title_changed_handler(move |title| {
                let _ = title_proxy.send_event(UserEvent::TitleChanged(id, title));
            })
            .with_on_page_load_handler(move |event, _url| {
                if let PageLoadEvent::Finished = event {
                    let _ = load_proxy.send_event(UserEvent::PageLoaded(id));
                }
            })
            .with_new_window_req_handler(move |url, _features| {
                if !content.block_popups {
                    let _ = popup_proxy.send_event(UserEvent::OpenInTab(id, url));
                } else {
                    debug!(tab = %id, url = %url, "pop-up blocked");
                }
                wry::NewWindowResponse::Deny
            })
            .with_download_started_handler(move |url, path: &mut PathBuf| {
                let Ok(mut s) = start_state.lock() else {
                    return false;
                };
                let suggested = path.clone();
                let suggested = Some(suggested.as_path()).filter(|p| !p.as_os_str().is_empty());
                match s.app.prepare_download(&url, suggested) {
                    Ok(target) => {
                        *path = target;
                        true
                    }
                    Err(e) => {
                        warn!(error = %e, url = %url, "download refused");
                        false
                    }
                }
            })
            .with_download_completed_handler(move |url, path, success| {
                let Ok(mut s) = done_state.lock() else {
                    return;
                };
                match s.app.complete_download(&url, path.as_deref(), success) {
                    Ok(notice) => {
                        let _ = done_proxy.send_event(UserEvent::Notice(notice));
                    }
                    Err(e) => warn!(error = %e, url = %url, "untracked download finished"),
                }
            });

        if s.app.is_proxy_running() {
            builder = builder.with_proxy_config(wry::ProxyConfig::Socks5(wry::ProxyEndpoint {
                host: "127.0.0.1".to_string(),
                port: s.app.proxy.socks_port().to_string(),
            }));
        }

        let view = builder.build_as_child(&self.window)?;
        info!(tab = %id, url, proxied = s.app.is_proxy_running(), "created page view");
        Ok(view)
    }

    fn ensure_content(&mut self, s: &BrowserState, id: TabId) {
        if self.content.contains_key(&id) {
            return;
        }
        let Some(url) = s.app.tabs.get_tab(id).and_then(|t| t.content.url().map(str::to_string)) else {
            return;
        };
        match self.build_content_view(s, id, &url) {
            Ok(view) => {
                self.content.insert(id, view);
            }
            Err(e) => {
                warn!(tab = %id, error = %e, "failed to create page view");
                self.notify(&Notice::error(format!("Failed to open {}", url)));
            }
        }
    }

    /// Shows the view belonging to the selected tab and hides the others.
    fn show_selected(&mut self, s: &BrowserState) {
        let selected = s.app.tabs.selected_tab().map(|t| (t.id, t.content.is_live()));
        let live = match selected {
            Some((id, true)) if !s.settings_open => {
                self.ensure_content(s, id);
                Some(id)
            }
            _ => None,
        };

        let _ = self.home.set_visible(!s.settings_open && live.is_none());
        for (id, view) in &self.content {
            let _ = view.set_visible(Some(*id) == live);
        }
        if live.is_none() && !s.settings_open {
            let _ = self.home.evaluate_script("if(window.__cb_focus)window.__cb_focus()");
        }
    }

    fn apply_navigation(&mut self, s: &BrowserState, nav: Navigation) {
        if !nav.promoted {
            if let Some(view) = self.content.get(&nav.tab) {
                if let Err(e) = view.load_url(&nav.url) {
                    warn!(tab = %nav.tab, error = %e, "load_url failed");
                }
            }
        }
        self.show_selected(s);
        self.sync_chrome(s);
    }

    fn refresh(&mut self, s: &BrowserState) {
        self.show_selected(s);
        self.sync_chrome(s);
    }

    fn handle_ipc(&mut self, s: &mut BrowserState, message: &str) {
        let Ok(msg) = serde_json::from_str::<serde_json::Value>(message) else {
            warn!("malformed IPC message");
            return;
        };
        let Some(cmd) = msg.get("cmd").and_then(|v| v.as_str()) else {
            return;
        };
        debug!(cmd, "ipc");

        let position = |key: &str| msg.get(key).and_then(|v| v.as_u64()).map(|v| v as usize);

        match cmd {
            "ready" => {
                self.sync_chrome(s);
                self.sync_home(s);
                self.sync_settings(s);
            }
            "select" => {
                if let Some(p) = position("position") {
                    match s.app.select_position(p) {
                        Ok(_) => self.refresh(s),
                        Err(e) => warn!(error = %e, "select failed"),
                    }
                }
            }
            "move" => {
                if let (Some(from), Some(to)) = (position("from"), position("to")) {
                    if let Err(e) = s.app.move_tab(from, to) {
                        warn!(error = %e, "move failed");
                    }
                    self.sync_chrome(s);
                }
            }
            "search" => {
                let input = msg.get("input").and_then(|v| v.as_str()).unwrap_or("");
                match s.app.submit_search(input) {
                    Ok(nav) => self.apply_navigation(s, nav),
                    Err(e) => self.notify(&Notice::error(e.to_string())),
                }
            }
            "start" => match s.app.open_homepage() {
                Ok(nav) => self.apply_navigation(s, nav),
                Err(e) => self.notify(&Notice::error(e.to_string())),
            },
            "toggle_proxy" => {
                let enable = !s.app.settings().proxy.enabled;
                match s.app.set_proxy_enabled(enable) {
                    Ok(()) => self.notify(&Notice::info(if enable {
                        "Starting Tor..."
                    } else {
                        "Stopping Tor..."
                    })),
                    Err(e) => self.notify(&Notice::error(e.to_string())),
                }
                self.sync_home(s);
            }
            "toggle_settings" => {
                s.settings_open = !s.settings_open;
                let _ = self
                    .chrome
                    .evaluate_script(&format!("window.__cb_settingsOpen({})", s.settings_open));
                self.layout(s);
                self.show_selected(s);
                if s.settings_open {
                    self.sync_settings(s);
                }
            }
            "set_setting" => {
                let (Some(key), Some(value)) = (msg.get("key").and_then(|v| v.as_str()), msg.get("value")) else {
                    return;
                };
                match s.app.update_setting(key, value.clone()) {
                    Ok(()) => {
                        if key.starts_with("content.") {
                            self.content.clear();
                        }
                        if key == "proxy.enabled" {
                            self.sync_home(s);
                        }
                    }
                    Err(e) => {
                        self.notify(&Notice::error(e.to_string()));
                        self.sync_settings(s);
                    }
                }
            }
            other => debug!(cmd = other, "unknown IPC command"),
        }
    }

    fn handle(&mut self, s: &mut BrowserState, event: UserEvent) {
        match event {
            UserEvent::Ipc(message) => self.handle_ipc(s, &message),
            UserEvent::TitleChanged(id, title) => {
                if s.app.on_title_changed(id, &title) {
                    self.sync_chrome(s);
                }
            }
            UserEvent::PageLoaded(id) => {
                if let Some(notice) = s.app.on_load_finished(id, true) {
                    self.notify(&notice);
                }
            }
            UserEvent::OpenInTab(id, url) => {
                if let Some(view) = self.content.get(&id) {
                    let _ = view.load_url(&url);
                }
            }
            UserEvent::Notice(notice) => self.notify(&notice),
            UserEvent::ProxyStatusReady => {
                let was_running = s.app.is_proxy_running();
                for notice in s.app.poll_proxy_status() {
                    self.notify(&notice);
                }
                if was_running != s.app.is_proxy_running() {
                    info!(running = s.app.is_proxy_running(), "proxy changed, rebuilding page views");
                    self.content.clear();
                    self.show_selected(s);
                }
                self.sync_chrome(s);
                self.sync_home(s);
            }
        }
    }
}

// ─── Main entry point ───

pub fn run() {
    crate::logging::init();

    let mut app = App::new(None, platform::get_data_dir()).expect("Failed to initialize CyberBrowser");

    let event_loop: EventLoop<UserEvent> = EventLoopBuilder::with_user_event().build();
    let proxy = event_loop.create_proxy();

    let waker_proxy = Mutex::new(proxy.clone());
    app.set_status_waker(Arc::new(move || {
        if let Ok(p) = waker_proxy.lock() {
            let _ = p.send_event(UserEvent::ProxyStatusReady);
        }
    }));
    app.startup();

    let geometry = app.settings().window;
    let window = WindowBuilder::new()
        .with_title("CyberBrowser")
        .with_inner_size(tao::dpi::LogicalSize::new(geometry.width as f64, geometry.height as f64))
        .with_position(tao::dpi::LogicalPosition::new(geometry.x as f64, geometry.y as f64))
        .build(&event_loop)
        .expect("Failed to create window");

    let chrome = WebViewBuilder::new()
        .with_custom_protocol(PROTOCOL.into(), |_id, request| serve_internal(request.uri().path()))
        .with_url(CHROME_URL)
        .with_bounds(chrome_rect(&window, false))
        .with_ipc_handler(ipc_forwarder(proxy.clone()))
        .with_devtools(cfg!(debug_assertions))
        .build_as_child(&window)
        .expect("Failed to create chrome WebView");

    let home = WebViewBuilder::new()
        .with_custom_protocol(PROTOCOL.into(), |_id, request| serve_internal(request.uri().path()))
        .with_url(HOME_URL)
        .with_bounds(content_rect(&window))
        .with_ipc_handler(ipc_forwarder(proxy.clone()))
        .with_devtools(cfg!(debug_assertions))
        .build_as_child(&window)
        .expect("Failed to create home WebView");

    let state = Arc::new(Mutex::new(BrowserState { app, settings_open: false }));
    let mut shell = Shell {
        window,
        chrome,
        home,
        content: HashMap::new(),
        proxy,
        state: Arc::clone(&state),
    };
    info!("window ready");

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } => {
                let geometry = window_geometry(&shell.window);
                shell.content.clear();
                if let Ok(mut s) = state.lock() {
                    s.app.shutdown(Some(geometry));
                }
                *control_flow = ControlFlow::Exit;
            }

            Event::WindowEvent {
                event: WindowEvent::Resized(_),
                ..
            } => {
                if let Ok(s) = state.lock() {
                    shell.layout(&s);
                }
            }

            Event::UserEvent(user_event) => {
                if let Ok(mut s) = state.lock() {
                    shell.handle(&mut s, user_event);
                }
            }

            _ => {}
        }
    });
}

//! RPC method handler for the CyberBrowser JSON protocol.
//!
//! Extracted from `rpc_server.rs` so it can be unit-tested independently.
//! The `handle_method` function dispatches method calls to the `App` core,
//! which lets the browser be driven headlessly (scripts, tests, other shells).

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::{json, Value};

use crate::app::App;
use crate::managers::download_manager::DownloadManagerTrait;
use crate::managers::tab_registry::TabRegistryTrait;
use crate::services::settings_engine::SettingsEngineTrait;
use crate::services::url_resolver;
use crate::types::tab::TabId;

/// Upper bound for `wait_ms` on proxy calls.
const MAX_WAIT_MS: u64 = 60_000;

fn param_str<'a>(params: &'a Value, key: &str) -> Result<&'a str, String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("missing {}", key))
}

fn param_usize(params: &Value, key: &str) -> Result<usize, String> {
    params
        .get(key)
        .and_then(|v| v.as_u64())
        .map(|v| v as usize)
        .ok_or_else(|| format!("missing {}", key))
}

fn param_tab(params: &Value) -> Result<TabId, String> {
    params
        .get("id")
        .and_then(|v| v.as_u64())
        .map(TabId)
        .ok_or_else(|| "missing id".to_string())
}

fn wait_duration(params: &Value) -> Option<Duration> {
    params
        .get("wait_ms")
        .and_then(|v| v.as_u64())
        .map(|ms| Duration::from_millis(ms.min(MAX_WAIT_MS)))
}

/// Toggles the proxy, optionally blocking for the outcome when `wait_ms` is given.
fn toggle_proxy(app: &Mutex<App>, enabled: bool, params: &Value) -> Result<Value, String> {
    let mut a = app.lock().map_err(|e| e.to_string())?;
    a.set_proxy_enabled(enabled).map_err(|e| e.to_string())?;
    match wait_duration(params) {
        Some(timeout) => match a.wait_proxy_status(timeout) {
            Some(status) => Ok(json!({"running": status.running, "reason": status.reason, "enabled": a.settings().proxy.enabled})),
            None => Ok(json!({"pending": true, "enabled": a.settings().proxy.enabled})),
        },
        None => Ok(json!({"pending": true, "enabled": enabled})),
    }
}

/// Dispatch a method call to the appropriate handler.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub fn handle_method(app: &Mutex<App>, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        "ping" => Ok(json!({"pong": true})),

        // ─── Tabs ───
        "tab.create" => {
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let id = a.new_tab();
            let position = a.tabs.position_of(id);
            Ok(json!({"id": id, "position": position}))
        }
        "tab.list" => {
            let a = app.lock().map_err(|e| e.to_string())?;
            Ok(json!({
                "tabs": a.tab_snapshots(),
                "affordance": a.tabs.affordance_position(),
            }))
        }
        "tab.select" => {
            let position = param_usize(params, "position")?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let before = a.tabs.tab_count();
            let id = a.select_position(position).map_err(|e| e.to_string())?;
            Ok(json!({"id": id, "created": a.tabs.tab_count() > before}))
        }
        "tab.move" => {
            let from = param_usize(params, "from")?;
            let to = param_usize(params, "to")?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            a.move_tab(from, to).map_err(|e| e.to_string())?;
            Ok(json!({"order": a.tabs.tab_order()}))
        }
        "tab.promote" => {
            let id = param_tab(params)?;
            let url = param_str(params, "url")?;
            let title = params.get("title").and_then(|v| v.as_str()).unwrap_or("");
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let outcome = a.tabs.promote(id, url, title).map_err(|e| e.to_string())?;
            Ok(json!({"id": id, "promoted": outcome == crate::types::tab::Promotion::Promoted}))
        }
        "tab.title" => {
            let id = param_tab(params)?;
            let title = param_str(params, "title")?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let updated = a.on_title_changed(id, title);
            let label = a.tabs.get_tab(id).map(|t| t.display_label());
            Ok(json!({"updated": updated, "label": label}))
        }

        // ─── Search / navigation ───
        "search.resolve" => {
            let input = param_str(params, "input")?;
            let a = app.lock().map_err(|e| e.to_string())?;
            let template = match params.get("engine").and_then(|v| v.as_str()) {
                Some(engine) => a.settings_engine.search_template(engine).to_string(),
                None => a.settings_engine.default_search_template().to_string(),
            };
            let url = url_resolver::resolve_input(input, &template)
                .into_url()
                .unwrap_or_else(|| a.settings().general.homepage.clone());
            Ok(json!({"url": url}))
        }
        "search.submit" => {
            let input = param_str(params, "input")?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let nav = a.submit_search(input).map_err(|e| e.to_string())?;
            serde_json::to_value(nav).map_err(|e| e.to_string())
        }
        "home.start" => {
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let nav = a.open_homepage().map_err(|e| e.to_string())?;
            serde_json::to_value(nav).map_err(|e| e.to_string())
        }

        // ─── Proxy ───
        "proxy.enable" => toggle_proxy(app, true, params),
        "proxy.disable" => toggle_proxy(app, false, params),
        "proxy.status" => {
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let notices = a.poll_proxy_status();
            let status = a.proxy_status().clone();
            Ok(json!({
                "running": status.running,
                "reason": status.reason,
                "enabled": a.settings().proxy.enabled,
                "proxy_url": a.proxy_url(),
                "notices": notices,
            }))
        }

        // ─── Settings ───
        "settings.get" => {
            let a = app.lock().map_err(|e| e.to_string())?;
            serde_json::to_value(a.settings()).map_err(|e| e.to_string())
        }
        "settings.set" => {
            let key = param_str(params, "key")?;
            let value = params.get("value").cloned().ok_or("missing value")?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            a.update_setting(key, value).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        // ─── Downloads ───
        "download.prepare" => {
            let url = param_str(params, "url")?;
            let suggested = params.get("suggested").and_then(|v| v.as_str()).map(Path::new);
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let path = a.prepare_download(url, suggested).map_err(|e| e.to_string())?;
            Ok(json!({"path": path}))
        }
        "download.complete" => {
            let url = param_str(params, "url")?;
            let success = params.get("success").and_then(|v| v.as_bool()).unwrap_or(true);
            let path = params.get("path").and_then(|v| v.as_str()).map(Path::new);
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let notice = a.complete_download(url, path, success).map_err(|e| e.to_string())?;
            Ok(json!({"notice": notice}))
        }
        "download.list" => {
            let a = app.lock().map_err(|e| e.to_string())?;
            let items = a.download_manager.list_downloads();
            serde_json::to_value(items).map_err(|e| e.to_string())
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}

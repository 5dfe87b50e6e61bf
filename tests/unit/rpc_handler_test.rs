//! Unit tests for the RPC handler: every method dispatched by `handle_method`.
//!
//! These tests exercise each method through the same code path used by the
//! real `cyberbrowser-rpc` binary, with settings and Tor data in a temp directory.

use std::sync::Mutex;

use serde_json::{json, Value};
use tempfile::TempDir;

use cyberbrowser::app::App;
use cyberbrowser::rpc_handler::handle_method;

/// Create a started App backed by a temp directory.
fn setup() -> (Mutex<App>, TempDir) {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let config_path = tmp.path().join("settings.json").to_string_lossy().to_string();
    let mut app = App::new(Some(config_path), tmp.path().join("data")).expect("Failed to init App");
    app.startup();
    (Mutex::new(app), tmp)
}

fn call(app: &Mutex<App>, method: &str, params: Value) -> Value {
    handle_method(app, method, &params).unwrap_or_else(|e| panic!("{} failed: {}", method, e))
}

// ─── Ping ───

#[test]
fn test_ping() {
    let (app, _tmp) = setup();
    assert_eq!(call(&app, "ping", json!({})), json!({"pong": true}));
}

#[test]
fn test_unknown_method_returns_error() {
    let (app, _tmp) = setup();
    let res = handle_method(&app, "nonexistent.method", &json!({}));
    assert!(res.unwrap_err().contains("unknown method"));
}

// ─── Tabs ───

#[test]
fn test_tab_create_and_list() {
    let (app, _tmp) = setup();

    let created = call(&app, "tab.create", json!({}));
    assert_eq!(created["position"], json!(1));

    let list = call(&app, "tab.list", json!({}));
    let tabs = list["tabs"].as_array().unwrap();
    assert_eq!(tabs.len(), 2);
    assert_eq!(tabs[0]["label"], json!("Home"));
    assert_eq!(tabs[1]["id"], created["id"]);
    assert_eq!(tabs[1]["selected"], json!(true));
    assert_eq!(list["affordance"], json!(2));
}

#[test]
fn test_tab_select_affordance_creates_tab() {
    let (app, _tmp) = setup();

    let existing = call(&app, "tab.select", json!({"position": 0}));
    assert_eq!(existing["created"], json!(false));

    let res = call(&app, "tab.select", json!({"position": 1}));
    assert_eq!(res["created"], json!(true));

    let list = call(&app, "tab.list", json!({}));
    assert_eq!(list["tabs"].as_array().unwrap().len(), 2);
}

#[test]
fn test_tab_select_out_of_range() {
    let (app, _tmp) = setup();
    let res = handle_method(&app, "tab.select", &json!({"position": 9}));
    assert!(res.unwrap_err().contains("out of range"));
    assert!(handle_method(&app, "tab.select", &json!({})).unwrap_err().contains("missing position"));
}

#[test]
fn test_tab_move() {
    let (app, _tmp) = setup();
    let first = call(&app, "tab.list", json!({}))["tabs"][0]["id"].clone();
    let second = call(&app, "tab.create", json!({}))["id"].clone();

    let res = call(&app, "tab.move", json!({"from": 1, "to": 0}));
    assert_eq!(res["order"], json!([second, first]));
}

#[test]
fn test_tab_promote_and_title() {
    let (app, _tmp) = setup();
    let id = call(&app, "tab.list", json!({}))["tabs"][0]["id"].clone();

    let res = call(&app, "tab.promote", json!({"id": id, "url": "https://example.com"}));
    assert_eq!(res["promoted"], json!(true));
    let res = call(&app, "tab.promote", json!({"id": id, "url": "https://example.org", "title": "Org"}));
    assert_eq!(res["promoted"], json!(false));

    let res = call(&app, "tab.title", json!({"id": id, "title": "A rather long page title"}));
    assert_eq!(res, json!({"updated": true, "label": "A rather lon..."}));

    let res = handle_method(&app, "tab.promote", &json!({"id": 999, "url": "https://x"}));
    assert!(res.unwrap_err().contains("Unknown tab identity"));
}

// ─── Search / navigation ───

#[test]
fn test_search_resolve_with_engine() {
    let (app, _tmp) = setup();
    call(&app, "settings.set", json!({"key": "search.engines.x", "value": "https://x.com/s?q={}"}));

    let res = call(&app, "search.resolve", json!({"input": "openai gpt", "engine": "x"}));
    assert_eq!(res["url"], json!("https://x.com/s?q=openai+gpt"));

    let res = call(&app, "search.resolve", json!({"input": "openai gpt"}));
    assert_eq!(res["url"], json!("https://duckduckgo.com/?q=openai+gpt"));
}

#[test]
fn test_search_submit_and_home_start() {
    let (app, _tmp) = setup();

    let nav = call(&app, "search.submit", json!({"input": "example.com"}));
    assert_eq!(nav["url"], json!("http://example.com"));
    assert_eq!(nav["promoted"], json!(true));

    call(&app, "tab.create", json!({}));
    let nav = call(&app, "home.start", json!({}));
    assert_eq!(nav["url"], json!("https://duckduckgo.com"));
    assert_eq!(nav["promoted"], json!(true));

    let tabs = call(&app, "tab.list", json!({}))["tabs"].clone();
    assert_eq!(tabs[0]["live"], json!(true));
    assert_eq!(tabs[0]["label"], json!("example.com"));
}

// ─── Proxy ───

#[test]
fn test_proxy_enable_without_directory() {
    let (app, _tmp) = setup();

    let res = call(&app, "proxy.enable", json!({"wait_ms": 5000}));
    assert_eq!(res["running"], json!(false));
    assert!(res["reason"].as_str().unwrap().contains("not configured"));
    assert_eq!(res["enabled"], json!(false));

    let status = call(&app, "proxy.status", json!({}));
    assert_eq!(status["running"], json!(false));
    assert_eq!(status["proxy_url"], Value::Null);
}

#[test]
fn test_proxy_disable_and_status() {
    let (app, _tmp) = setup();
    let res = call(&app, "proxy.disable", json!({}));
    assert_eq!(res["pending"], json!(true));
    assert_eq!(res["enabled"], json!(false));

    let mut status = Value::Null;
    for _ in 0..100 {
        status = call(&app, "proxy.status", json!({}));
        if status["reason"] == json!("Tor stopped") {
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(50));
    }
    assert_eq!(status["reason"], json!("Tor stopped"));
    assert_eq!(status["running"], json!(false));
}

// ─── Settings ───

#[test]
fn test_settings_get_and_set() {
    let (app, _tmp) = setup();

    let settings = call(&app, "settings.get", json!({}));
    assert_eq!(settings["proxy"]["socks_port"], json!(9050));

    call(&app, "settings.set", json!({"key": "content.autoplay", "value": true}));
    let settings = call(&app, "settings.get", json!({}));
    assert_eq!(settings["content"]["autoplay"], json!(true));
}

#[test]
fn test_settings_set_invalid() {
    let (app, _tmp) = setup();
    let res = handle_method(&app, "settings.set", &json!({"key": "bogus.key", "value": 1}));
    assert!(res.unwrap_err().contains("Invalid settings key"));
    let res = handle_method(&app, "settings.set", &json!({"key": "content.autoplay"}));
    assert!(res.unwrap_err().contains("missing value"));
}

// ─── Downloads ───

#[test]
fn test_download_flow() {
    let (app, tmp) = setup();
    let dir = tmp.path().join("downloads");
    call(&app, "settings.set", json!({"key": "downloads.directory", "value": dir}));

    let res = call(&app, "download.prepare", json!({"url": "https://example.com/a.txt"}));
    assert_eq!(res["path"], json!(dir.join("a.txt")));
    let res = call(&app, "download.prepare", json!({"url": "https://example.com/a.txt", "suggested": "a.txt"}));
    assert_eq!(res["path"], json!(dir.join("a (1).txt")));

    let res = call(&app, "download.complete", json!({"url": "https://example.com/a.txt", "success": false}));
    assert_eq!(res["notice"]["level"], json!("error"));

    let list = call(&app, "download.list", json!({}));
    let items = list.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[1]["status"], json!("Failed"));
    assert_eq!(items[0]["status"], json!("InProgress"));
}

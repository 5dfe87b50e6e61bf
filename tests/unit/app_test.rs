use std::fs;
use std::time::Duration;

use cyberbrowser::app::{App, NoticeLevel};
use cyberbrowser::managers::download_manager::DownloadManagerTrait;
use cyberbrowser::managers::tab_registry::TabRegistryTrait;
use cyberbrowser::types::errors::AppError;
use cyberbrowser::types::proxy::{ProxyConfig, ProxyTimings};
use cyberbrowser::types::settings::WindowGeometry;
use serde_json::json;
use tempfile::TempDir;

const WAIT: Duration = Duration::from_secs(5);

/// Create an App whose settings and Tor data live in a temp directory.
fn setup() -> (App, TempDir) {
    setup_with_startup_timeout(Duration::from_secs(2))
}

fn setup_with_startup_timeout(startup_timeout: Duration) -> (App, TempDir) {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let config_path = tmp.path().join("settings.json").to_string_lossy().to_string();
    let mut proxy_config = ProxyConfig::new(None, tmp.path().join("data"));
    proxy_config.timings = ProxyTimings {
        poll_interval: Duration::from_millis(50),
        startup_timeout,
        shutdown_grace: Duration::from_secs(2),
    };
    let app = App::with_proxy_config(Some(config_path), proxy_config).expect("Failed to init App");
    (app, tmp)
}

fn started() -> (App, TempDir) {
    let (mut app, tmp) = setup();
    app.startup();
    (app, tmp)
}

#[test]
fn test_startup_opens_one_home_tab() {
    let (app, _tmp) = started();
    let tabs = app.tab_snapshots();
    assert_eq!(tabs.len(), 1);
    assert_eq!(tabs[0].label, "Home");
    assert!(tabs[0].selected);
    assert!(!tabs[0].live);
}

#[test]
fn test_submit_search_promotes_selected_tab() {
    let (mut app, _tmp) = started();
    app.update_setting("search.engines.x", json!("https://x.com/s?q={}")).unwrap();
    app.update_setting("general.default_search_engine", json!("x")).unwrap();

    let nav = app.submit_search("openai gpt").unwrap();
    assert_eq!(nav.url, "https://x.com/s?q=openai+gpt");
    assert!(nav.promoted);
    assert_eq!(Some(nav.tab), app.tabs.selected());

    let again = app.submit_search("example.com").unwrap();
    assert_eq!(again.url, "http://example.com");
    assert!(!again.promoted);
    assert_eq!(again.tab, nav.tab);
}

#[test]
fn test_empty_search_and_start_open_homepage() {
    let (mut app, _tmp) = started();
    let homepage = app.settings().general.homepage.clone();

    assert_eq!(app.submit_search("   ").unwrap().url, homepage);

    app.new_tab();
    let nav = app.open_homepage().unwrap();
    assert_eq!(nav.url, homepage);
    assert!(nav.promoted);
}

#[test]
fn test_search_without_selection_fails() {
    let (mut app, _tmp) = setup();
    assert_eq!(app.submit_search("rust"), Err(AppError::NoSelection));
}

#[test]
fn test_select_affordance_creates_tab() {
    let (mut app, _tmp) = started();
    let plus = app.tabs.affordance_position();
    let id = app.select_position(plus).unwrap();
    assert_eq!(app.tabs.tab_count(), 2);
    assert_eq!(app.tabs.selected(), Some(id));
}

#[test]
fn test_move_out_of_range_is_tab_error() {
    let (mut app, _tmp) = started();
    assert!(matches!(app.move_tab(0, 4), Err(AppError::Tab(_))));
}

#[test]
fn test_title_changes_and_load_failures() {
    let (mut app, _tmp) = started();
    let nav = app.submit_search("https://example.com/page").unwrap();

    assert!(!app.on_title_changed(nav.tab, "   "));
    assert!(app.on_title_changed(nav.tab, "Example Domain Homepage"));
    assert_eq!(app.tab_snapshots()[0].label, "Example Doma...");

    assert_eq!(app.on_load_finished(nav.tab, true), None);
    let notice = app.on_load_finished(nav.tab, false).unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(notice.message.contains("https://example.com/page"));
}

#[test]
fn test_enable_without_tor_directory_reverts_toggle() {
    let (mut app, _tmp) = started();
    app.set_proxy_enabled(true).unwrap();
    assert!(app.settings().proxy.enabled);

    let status = app.wait_proxy_status(WAIT).expect("status should arrive");
    assert!(!status.running);
    assert!(status.reason.contains("not configured"));
    assert!(!app.settings().proxy.enabled);
    assert!(!app.is_proxy_running());
    assert_eq!(app.proxy_url(), None);
}

#[test]
fn test_repeated_failed_enable_reverts_toggle_each_time() {
    let (mut app, _tmp) = started();

    for attempt in 0..2 {
        app.set_proxy_enabled(true).unwrap();
        assert!(app.settings().proxy.enabled);

        let mut notices = Vec::new();
        for _ in 0..100 {
            notices = app.poll_proxy_status();
            if !notices.is_empty() {
                break;
            }
            std::thread::sleep(Duration::from_millis(50));
        }
        assert_eq!(notices.len(), 1, "attempt {}", attempt);
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert!(!app.settings().proxy.enabled, "attempt {}", attempt);
    }
}

#[test]
fn test_repeated_failed_enable_reverts_when_waiting() {
    let (mut app, _tmp) = started();

    for _ in 0..2 {
        app.set_proxy_enabled(true).unwrap();
        let status = app.wait_proxy_status(WAIT).expect("status should arrive");
        assert!(!status.running);
        assert!(!app.settings().proxy.enabled);
    }
}

#[test]
fn test_enabled_at_startup_without_tor_reverts() {
    let (mut app, tmp) = setup();
    fs::write(tmp.path().join("settings.json"), r#"{"proxy":{"enabled":true}}"#).unwrap();

    app.startup();
    let status = app.wait_proxy_status(WAIT).expect("status should arrive");
    assert!(!status.running);
    assert!(!app.settings().proxy.enabled);
}

#[test]
fn test_poll_proxy_status_reports_notice() {
    let (mut app, _tmp) = started();
    app.set_proxy_enabled(true).unwrap();

    let mut notices = Vec::new();
    for _ in 0..100 {
        notices = app.poll_proxy_status();
        if !notices.is_empty() {
            break;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
}

#[test]
fn test_disable_reports_stopped() {
    let (mut app, _tmp) = started();
    app.set_proxy_enabled(false).unwrap();
    let status = app.wait_proxy_status(WAIT).expect("status should arrive");
    assert!(!status.running);
    assert_eq!(status.reason, "Tor stopped");
}

#[test]
fn test_update_setting_forwards_download_directory() {
    let (mut app, tmp) = started();
    let dir = tmp.path().join("dl");
    app.update_setting("downloads.directory", json!(dir)).unwrap();
    assert_eq!(app.download_manager.directory(), dir.as_path());

    let path = app.prepare_download("https://example.com/a.zip", None).unwrap();
    assert_eq!(path, dir.join("a.zip"));

    let notice = app
        .complete_download("https://example.com/a.zip", Some(path.as_path()), true)
        .unwrap();
    assert_eq!(notice.level, NoticeLevel::Info);
    assert_eq!(notice.message, "Downloaded a.zip");
}

#[test]
fn test_proxy_enabled_requires_boolean() {
    let (mut app, _tmp) = started();
    let result = app.update_setting("proxy.enabled", json!("yes"));
    assert!(matches!(result, Err(AppError::Settings(_))));
}

#[test]
fn test_shutdown_saves_geometry() {
    let (mut app, tmp) = started();
    let geometry = WindowGeometry { x: 10, y: 20, width: 1000, height: 700 };
    app.shutdown(Some(geometry));

    let saved = fs::read_to_string(tmp.path().join("settings.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&saved).unwrap();
    assert_eq!(value["window"]["width"], json!(1000));
    assert_eq!(value["window"]["x"], json!(10));
}

#[cfg(unix)]
#[test]
fn test_enable_with_tor_runs_and_shutdown_stops() {
    use std::net::TcpListener;
    use std::os::unix::fs::PermissionsExt;

    let (mut app, tmp) = started();
    let bin = tmp.path().join("bin");
    fs::create_dir_all(&bin).unwrap();
    let tor = bin.join("tor");
    fs::write(&tor, "#!/bin/sh\nexec sleep 30\n").unwrap();
    fs::set_permissions(&tor, fs::Permissions::from_mode(0o755)).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    app.update_setting("proxy.executable_dir", json!(bin)).unwrap();
    app.update_setting("proxy.socks_port", json!(port)).unwrap();

    app.set_proxy_enabled(true).unwrap();
    let status = app.wait_proxy_status(WAIT).expect("status should arrive");
    assert!(status.running, "{}", status.reason);
    assert!(app.proxy.is_running());
    assert_eq!(app.proxy_url(), Some(format!("socks5://127.0.0.1:{}", port)));

    app.shutdown(None);
    assert!(!app.proxy.is_running());
    assert!(!app.is_proxy_running());
    // The toggle is remembered for the next launch.
    assert!(app.settings().proxy.enabled);
    assert!(tmp.path().join("data").join("tor").is_dir());
}

#[cfg(unix)]
#[test]
fn test_disable_during_pending_start_cancels_it() {
    use std::net::TcpListener;
    use std::os::unix::fs::PermissionsExt;
    use std::time::Instant;

    // Long enough that only cancellation can end the start early.
    let (mut app, tmp) = setup_with_startup_timeout(Duration::from_secs(20));
    app.startup();
    let bin = tmp.path().join("bin");
    fs::create_dir_all(&bin).unwrap();
    let tor = bin.join("tor");
    fs::write(&tor, "#!/bin/sh\nexec sleep 30\n").unwrap();
    fs::set_permissions(&tor, fs::Permissions::from_mode(0o755)).unwrap();

    // A port nobody listens on, so the start keeps polling.
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    app.update_setting("proxy.executable_dir", json!(bin)).unwrap();
    app.update_setting("proxy.socks_port", json!(port)).unwrap();

    app.set_proxy_enabled(true).unwrap();
    std::thread::sleep(Duration::from_millis(300));
    assert!(!app.proxy.is_running());

    let begun = Instant::now();
    app.set_proxy_enabled(false).unwrap();
    let status = app.wait_proxy_status(Duration::from_secs(10)).expect("status should arrive");
    assert!(begun.elapsed() < Duration::from_secs(10));
    assert!(!status.running);
    assert_eq!(status.reason, "Tor stopped");

    // The cancelled start reported under the superseded request and is dropped.
    std::thread::sleep(Duration::from_millis(200));
    assert!(app.poll_proxy_status().is_empty());
    assert_eq!(app.proxy_status().reason, "Tor stopped");
    assert!(!app.settings().proxy.enabled);
    assert!(!app.proxy.is_running());
    assert!(!app.is_proxy_running());
}

//! Process-level tests for the Tor supervisor, using a shell script standing in for `tor`.

#![cfg(unix)]

use std::fs;
use std::net::TcpListener;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use cyberbrowser::services::proxy_supervisor::ProxySupervisor;
use cyberbrowser::types::errors::ProxyError;
use cyberbrowser::types::proxy::{ProxyConfig, ProxyTimings};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn fake_tor(dir: &Path, body: &str) {
    let path = dir.join("tor");
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
}

fn fast_timings() -> ProxyTimings {
    ProxyTimings {
        poll_interval: Duration::from_millis(50),
        startup_timeout: Duration::from_secs(2),
        shutdown_grace: Duration::from_secs(2),
    }
}

fn supervisor(bin_dir: Option<PathBuf>, data: &TempDir, socks_port: u16) -> ProxySupervisor {
    let mut config = ProxyConfig::new(bin_dir, data.path().to_path_buf());
    config.socks_port = socks_port;
    config.timings = fast_timings();
    ProxySupervisor::new(config)
}

/// A port nothing is listening on.
fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

#[tokio::test]
async fn test_start_without_directory_is_configuration_missing() {
    let data = TempDir::new().unwrap();
    let mut sup = supervisor(None, &data, closed_port());

    let result = sup.start(&CancellationToken::new()).await;

    assert_eq!(result, Err(ProxyError::ConfigurationMissing));
    assert!(!sup.is_running());
}

#[tokio::test]
async fn test_start_with_empty_directory_is_executable_not_found() {
    let bin = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    let mut sup = supervisor(Some(bin.path().to_path_buf()), &data, closed_port());

    let result = sup.start(&CancellationToken::new()).await;

    assert_eq!(result, Err(ProxyError::ExecutableNotFound(bin.path().to_path_buf())));
    assert!(!sup.is_running());
}

#[tokio::test]
async fn test_non_executable_file_is_not_used() {
    let bin = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    let path = bin.path().join("tor");
    fs::write(&path, "#!/bin/sh\nexec sleep 30\n").unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
    let mut sup = supervisor(Some(bin.path().to_path_buf()), &data, closed_port());

    let result = sup.start(&CancellationToken::new()).await;

    assert!(matches!(result, Err(ProxyError::ExecutableNotFound(_))));
}

#[tokio::test]
async fn test_start_succeeds_when_socks_port_opens_then_stop() {
    let bin = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    fake_tor(bin.path(), "exec sleep 30");
    let port = closed_port();

    // The port opens shortly after launch, like a bootstrapping Tor.
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(300));
        let _listener = TcpListener::bind(("127.0.0.1", port)).unwrap();
        thread::sleep(Duration::from_secs(5));
    });

    let mut sup = supervisor(Some(bin.path().to_path_buf()), &data, port);
    sup.start(&CancellationToken::new()).await.unwrap();

    assert!(sup.is_running());
    assert!(sup.pid().is_some());
    assert!(data.path().join("tor").is_dir());

    tokio::time::timeout(Duration::from_secs(10), sup.stop())
        .await
        .expect("stop should finish within the grace period");
    assert!(!sup.is_running());
    assert_eq!(sup.pid(), None);
}

#[tokio::test]
async fn test_start_when_already_running_is_noop() {
    let bin = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    fake_tor(bin.path(), "exec sleep 30");
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let mut sup = supervisor(Some(bin.path().to_path_buf()), &data, port);
    sup.start(&CancellationToken::new()).await.unwrap();
    let pid = sup.pid();

    sup.start(&CancellationToken::new()).await.unwrap();
    assert_eq!(sup.pid(), pid);

    sup.stop().await;
}

#[tokio::test]
async fn test_startup_timeout_when_port_never_opens() {
    let bin = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    fake_tor(bin.path(), "exec sleep 30");
    let mut sup = supervisor(Some(bin.path().to_path_buf()), &data, closed_port());

    let result = sup.start(&CancellationToken::new()).await;

    assert_eq!(result, Err(ProxyError::StartupTimeout(Duration::from_secs(2))));
    assert!(!sup.is_running());
    assert_eq!(sup.pid(), None);
}

#[tokio::test]
async fn test_process_exiting_during_startup() {
    let bin = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    fake_tor(bin.path(), "exit 3");
    let mut sup = supervisor(Some(bin.path().to_path_buf()), &data, closed_port());

    let result = sup.start(&CancellationToken::new()).await;

    assert!(matches!(result, Err(ProxyError::ExitedDuringStartup(_))), "{:?}", result);
    assert!(!sup.is_running());
}

#[tokio::test]
async fn test_cancellation_aborts_pending_start() {
    let bin = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    fake_tor(bin.path(), "exec sleep 30");
    let mut sup = supervisor(Some(bin.path().to_path_buf()), &data, closed_port());

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        canceller.cancel();
    });

    let result = sup.start(&token).await;

    assert_eq!(result, Err(ProxyError::Cancelled));
    assert!(!sup.is_running());
    assert_eq!(sup.pid(), None);
}

#[tokio::test]
async fn test_stop_kills_process_ignoring_termination() {
    let bin = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    fake_tor(bin.path(), "trap '' TERM\nwhile true; do sleep 1; done");
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let mut config = ProxyConfig::new(Some(bin.path().to_path_buf()), data.path().to_path_buf());
    config.socks_port = port;
    config.timings = ProxyTimings {
        shutdown_grace: Duration::from_millis(300),
        ..fast_timings()
    };
    let mut sup = ProxySupervisor::new(config);
    sup.start(&CancellationToken::new()).await.unwrap();

    tokio::time::timeout(Duration::from_secs(5), sup.stop())
        .await
        .expect("forced kill should follow the grace period");
    assert!(!sup.is_running());
}

#[tokio::test]
async fn test_is_running_notices_process_death() {
    let bin = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    fake_tor(bin.path(), "exec sleep 1");
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let mut sup = supervisor(Some(bin.path().to_path_buf()), &data, port);
    sup.start(&CancellationToken::new()).await.unwrap();
    assert!(sup.is_running());

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(!sup.is_running());
}

#[tokio::test]
async fn test_stop_when_idle_is_harmless() {
    let data = TempDir::new().unwrap();
    let mut sup = supervisor(None, &data, closed_port());
    sup.stop().await;
    sup.stop().await;
    assert!(!sup.is_running());
}

//! Runs the proxy supervisor off the UI thread.
//!
//! Start and stop requests execute as tasks on a small tokio runtime owned by the
//! controller; each finishes by handing a [`ProxyStatus`] to the caller-supplied
//! `notify` callback, which posts it back to the UI event loop. A stop request
//! cancels any start still waiting for the SOCKS port.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::runtime::{Builder, Runtime};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::services::proxy_supervisor::ProxySupervisor;
use crate::types::proxy::{ProxyConfig, ProxyStatus};

pub struct ProxyController {
    runtime: Runtime,
    supervisor: Arc<Mutex<ProxySupervisor>>,
    pending: Option<CancellationToken>,
    executable_dir: Option<PathBuf>,
    socks_port: u16,
    control_port: u16,
}

impl ProxyController {
    pub fn new(config: ProxyConfig) -> std::io::Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("cyberbrowser-proxy")
            .enable_all()
            .build()?;

        Ok(Self {
            runtime,
            executable_dir: config.executable_dir.clone(),
            socks_port: config.socks_port,
            control_port: config.control_port,
            supervisor: Arc::new(Mutex::new(ProxySupervisor::new(config))),
            pending: None,
        })
    }

    /// Takes effect on the next start request.
    pub fn set_executable_dir(&mut self, dir: Option<PathBuf>) {
        self.executable_dir = dir;
    }

    /// Takes effect on the next start request.
    pub fn set_ports(&mut self, socks_port: u16, control_port: u16) {
        self.socks_port = socks_port;
        self.control_port = control_port;
    }

    pub fn socks_port(&self) -> u16 {
        self.socks_port
    }

    fn cancel_pending(&mut self) {
        if let Some(token) = self.pending.take() {
            debug!("cancelling pending tor start");
            token.cancel();
        }
    }

    /// Starts Tor in the background; `notify` receives the outcome.
    pub fn request_start<F>(&mut self, notify: F)
    where
        F: FnOnce(ProxyStatus) + Send + 'static,
    {
        self.cancel_pending();
        let token = CancellationToken::new();
        self.pending = Some(token.clone());

        let supervisor = Arc::clone(&self.supervisor);
        let dir = self.executable_dir.clone();
        let (socks_port, control_port) = (self.socks_port, self.control_port);

        self.runtime.spawn(async move {
            let status = {
                let mut sup = supervisor.lock().await;
                sup.set_executable_dir(dir);
                sup.set_ports(socks_port, control_port);
                match sup.start(&token).await {
                    Ok(()) => ProxyStatus::running(format!(
                        "Tor is running on 127.0.0.1:{}",
                        socks_port
                    )),
                    Err(e) => ProxyStatus::stopped(e.to_string()),
                }
            };
            notify(status);
        });
    }

    /// Stops Tor in the background, cancelling a start that is still polling.
    pub fn request_stop<F>(&mut self, notify: F)
    where
        F: FnOnce(ProxyStatus) + Send + 'static,
    {
        self.cancel_pending();
        let supervisor = Arc::clone(&self.supervisor);
        self.runtime.spawn(async move {
            supervisor.lock().await.stop().await;
            notify(ProxyStatus::stopped("Tor stopped"));
        });
    }

    /// Cancels any pending start and blocks until Tor has exited.
    pub fn stop_blocking(&mut self) {
        self.cancel_pending();
        let supervisor = Arc::clone(&self.supervisor);
        self.runtime.block_on(async move {
            supervisor.lock().await.stop().await;
        });
        info!("tor supervisor shut down");
    }

    /// False while a start or stop is still in flight.
    pub fn is_running(&self) -> bool {
        match self.supervisor.try_lock() {
            Ok(mut sup) => sup.is_running(),
            Err(_) => false,
        }
    }
}

impl Drop for ProxyController {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

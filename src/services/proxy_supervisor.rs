//! Tor proxy supervisor.
//!
//! Locates the `tor` binary inside the configured directory, launches it with a
//! fixed SOCKS/control configuration, waits for the SOCKS port to accept TCP
//! connections, and terminates it (graceful first, forced after a grace period).
//! Readiness is the only health signal; the control port protocol is not spoken.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tokio::time::{sleep, timeout, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::platform;
use crate::types::errors::ProxyError;
use crate::types::proxy::ProxyConfig;

const LOOPBACK: &str = "127.0.0.1";

/// Owns the Tor child process. At most one child exists at a time.
pub struct ProxySupervisor {
    config: ProxyConfig,
    executable: Option<PathBuf>,
    child: Option<Child>,
    running: bool,
}

impl ProxySupervisor {
    pub fn new(config: ProxyConfig) -> Self {
        Self {
            config,
            executable: None,
            child: None,
            running: false,
        }
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Points the supervisor at a new executable directory and forgets the cached binary.
    pub fn set_executable_dir(&mut self, dir: Option<PathBuf>) {
        if self.config.executable_dir != dir {
            self.config.executable_dir = dir;
            self.executable = None;
        }
    }

    pub fn set_ports(&mut self, socks_port: u16, control_port: u16) {
        self.config.socks_port = socks_port;
        self.config.control_port = control_port;
    }

    /// Resolves (once) the first usable binary among the platform names.
    pub fn resolve_executable(&mut self) -> Result<PathBuf, ProxyError> {
        if let Some(path) = &self.executable {
            return Ok(path.clone());
        }
        let dir = self
            .config
            .executable_dir
            .clone()
            .ok_or(ProxyError::ConfigurationMissing)?;

        let found = platform::proxy_executable_names()
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| platform::is_executable(candidate))
            .ok_or(ProxyError::ExecutableNotFound(dir))?;

        debug!(path = %found.display(), "resolved tor executable");
        self.executable = Some(found.clone());
        Ok(found)
    }

    /// The fixed command line handed to Tor.
    pub fn command_args(&self) -> Vec<OsString> {
        let data_dir = platform::tor_data_dir(&self.config.data_dir);
        vec![
            "--SocksPort".into(),
            format!("{}:{}", LOOPBACK, self.config.socks_port).into(),
            "--ControlPort".into(),
            self.config.control_port.to_string().into(),
            "--DataDirectory".into(),
            data_dir.into_os_string(),
            "--Log".into(),
            "notice stdout".into(),
            "--CookieAuthentication".into(),
            "1".into(),
            "--ExitRelay".into(),
            "0".into(),
        ]
    }

    fn prepare_data_dir(&self) -> Result<(), ProxyError> {
        let dir = platform::tor_data_dir(&self.config.data_dir);
        std::fs::create_dir_all(&dir).map_err(|e| ProxyError::DataDirectory(e.to_string()))?;
        #[cfg(unix)]
        {
            // Tor refuses a group/world readable data directory.
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o700))
                .map_err(|e| ProxyError::DataDirectory(e.to_string()))?;
        }
        Ok(())
    }

    /// Launches Tor and waits until its SOCKS port accepts connections.
    ///
    /// Returns immediately when already running. On timeout, early exit, or
    /// cancellation the child is torn down before the error is returned.
    pub async fn start(&mut self, cancel: &CancellationToken) -> Result<(), ProxyError> {
        if self.is_running() {
            return Ok(());
        }
        if cancel.is_cancelled() {
            return Err(ProxyError::Cancelled);
        }
        // A child that never became ready (or died) must not linger.
        self.stop().await;

        let executable = self.resolve_executable()?;
        self.prepare_data_dir()?;

        let mut command = Command::new(&executable);
        command
            .args(self.command_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let mut child = command
            .spawn()
            .map_err(|e| ProxyError::SpawnFailed(e.to_string()))?;
        info!(pid = ?child.id(), path = %executable.display(), "tor launched");

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(target: "cyberbrowser::tor", "{}", line);
                }
            });
        }
        self.child = Some(child);

        match self.wait_ready(cancel).await {
            Ok(()) => {
                self.running = true;
                info!(port = self.config.socks_port, "tor SOCKS port ready");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "tor startup failed");
                self.stop().await;
                Err(e)
            }
        }
    }

    async fn wait_ready(&mut self, cancel: &CancellationToken) -> Result<(), ProxyError> {
        let timings = self.config.timings;
        let deadline = Instant::now() + timings.startup_timeout;
        let addr = (LOOPBACK, self.config.socks_port);

        loop {
            if let Some(status) = self.child_exit_status() {
                return Err(ProxyError::ExitedDuringStartup(status.to_string()));
            }

            let attempt = timeout(timings.poll_interval, TcpStream::connect(addr));
            tokio::select! {
                _ = cancel.cancelled() => return Err(ProxyError::Cancelled),
                result = attempt => {
                    if let Ok(Ok(_stream)) = result {
                        return Ok(());
                    }
                }
            }

            if Instant::now() >= deadline {
                return Err(ProxyError::StartupTimeout(timings.startup_timeout));
            }
            tokio::select! {
                _ = cancel.cancelled() => return Err(ProxyError::Cancelled),
                _ = sleep(timings.poll_interval) => {}
            }
            if Instant::now() >= deadline {
                return Err(ProxyError::StartupTimeout(timings.startup_timeout));
            }
        }
    }

    fn child_exit_status(&mut self) -> Option<ExitStatus> {
        let child = self.child.as_mut()?;
        match child.try_wait() {
            Ok(status) => status,
            Err(e) => {
                warn!(error = %e, "failed to query tor process state");
                None
            }
        }
    }

    /// Terminates the child, escalating to a forced kill after the grace period.
    /// Safe to call when nothing is running.
    pub async fn stop(&mut self) {
        self.running = false;
        let Some(mut child) = self.child.take() else {
            return;
        };

        if let Ok(Some(status)) = child.try_wait() {
            debug!(%status, "tor already exited");
            return;
        }

        request_termination(&mut child);
        match timeout(self.config.timings.shutdown_grace, child.wait()).await {
            Ok(Ok(status)) => info!(%status, "tor stopped"),
            Ok(Err(e)) => warn!(error = %e, "failed waiting for tor"),
            Err(_) => {
                warn!("tor ignored termination request, killing");
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "failed to kill tor");
                }
            }
        }
    }

    /// True only when the flag is set and the OS still reports the child alive.
    pub fn is_running(&mut self) -> bool {
        if !self.running {
            return false;
        }
        match self.child_exit_status() {
            None if self.child.is_some() => true,
            _ => {
                info!("tor process is no longer alive");
                self.running = false;
                self.child = None;
                false
            }
        }
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }
}

#[cfg(unix)]
fn request_termination(child: &mut Child) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    match child.id() {
        Some(pid) => {
            if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
                warn!(pid, error = %e, "SIGTERM failed");
            }
        }
        None => debug!("tor already reaped"),
    }
}

#[cfg(not(unix))]
fn request_termination(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        warn!(error = %e, "failed to terminate tor");
    }
}

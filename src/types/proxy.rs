use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_SOCKS_PORT: u16 = 9050;
pub const DEFAULT_CONTROL_PORT: u16 = 9051;

/// Timing knobs for the proxy readiness poll and shutdown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProxyTimings {
    pub poll_interval: Duration,
    pub startup_timeout: Duration,
    pub shutdown_grace: Duration,
}

impl Default for ProxyTimings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            startup_timeout: Duration::from_secs(30),
            shutdown_grace: Duration::from_secs(10),
        }
    }
}

/// Launch configuration for the Tor process.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyConfig {
    /// Directory holding the `tor` binary. `None` means the proxy is unavailable.
    pub executable_dir: Option<PathBuf>,
    /// Per-user Tor data directory, created on start.
    pub data_dir: PathBuf,
    pub socks_port: u16,
    pub control_port: u16,
    pub timings: ProxyTimings,
}

impl ProxyConfig {
    pub fn new(executable_dir: Option<PathBuf>, data_dir: PathBuf) -> Self {
        Self {
            executable_dir,
            data_dir,
            socks_port: DEFAULT_SOCKS_PORT,
            control_port: DEFAULT_CONTROL_PORT,
            timings: ProxyTimings::default(),
        }
    }
}

/// Status notification posted after every start or stop attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyStatus {
    pub running: bool,
    pub reason: String,
}

impl ProxyStatus {
    pub fn running(reason: impl Into<String>) -> Self {
        Self { running: true, reason: reason.into() }
    }

    pub fn stopped(reason: impl Into<String>) -> Self {
        Self { running: false, reason: reason.into() }
    }
}

//! Tracing setup shared by the browser and the RPC server.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `cyberbrowser=debug`.
pub const LOG_ENV: &str = "CYBERBROWSER_LOG";

/// Installs a stderr fmt subscriber. Later calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}

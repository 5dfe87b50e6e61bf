// CyberBrowser state managers
// Managers own in-memory state driven by the UI thread: tab order and downloads.

pub mod download_manager;
pub mod tab_registry;

// CyberBrowser shared type definitions
// Each submodule defines types used across the application.

pub mod download;
pub mod errors;
pub mod proxy;
pub mod settings;
pub mod tab;

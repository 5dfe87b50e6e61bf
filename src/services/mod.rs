// CyberBrowser services
// Services provide settings persistence, input resolution, and the Tor proxy lifecycle.

pub mod proxy_controller;
pub mod proxy_supervisor;
pub mod settings_engine;
pub mod url_resolver;

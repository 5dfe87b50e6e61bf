//! CyberBrowser UI layer.
//!
//! Uses `wry` for cross-platform WebView rendering:
//! - Windows: WebView2
//! - Linux: WebKitGTK
//! - macOS: WKWebView
//!
//! The tab strip and home view are HTML/CSS/JS pages inside child webviews;
//! pages the user visits get child webviews of their own.

pub mod webview_app;

//! CyberBrowser: a minimal tabbed web browser with an optional Tor SOCKS proxy.
//!
//! Entry point: opens the browser window when built with the `gui` feature.
//! Without it, runs a console walkthrough of the browser core.

#[cfg(feature = "gui")]
fn main() {
    cyberbrowser::ui::webview_app::run();
}

#[cfg(not(feature = "gui"))]
fn main() {
    cyberbrowser::logging::init();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║              CyberBrowser v{} · Demo Mode                 ║", env!("CARGO_PKG_VERSION"));
    println!("║              Fast. Anonymous. Tor-Ready.                     ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let data_dir = std::env::temp_dir().join("cyberbrowser-demo");
    let config_path = data_dir.join("settings.json").to_string_lossy().to_string();

    let mut app = match cyberbrowser::app::App::new(Some(config_path), data_dir) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Failed to initialize CyberBrowser: {}", e);
            std::process::exit(1);
        }
    };
    app.startup();

    demo_settings(&app);
    demo_search(&mut app);
    demo_tabs(&mut app);
    demo_proxy(&mut app);

    app.shutdown(None);
    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("  Build with `--features gui` to open the browser window.");
    println!("═══════════════════════════════════════════════════════════════");
}

#[cfg(not(feature = "gui"))]
fn section(name: &str) {
    println!("───────────────────────────────────────────────────────────────");
    println!("  {}", name);
    println!("───────────────────────────────────────────────────────────────");
}

#[cfg(not(feature = "gui"))]
fn print_tabs(app: &cyberbrowser::app::App) {
    for tab in app.tab_snapshots() {
        let marker = if tab.selected { "*" } else { " " };
        println!(
            "  {} [{}] #{} {:<16} {}",
            marker,
            tab.position,
            tab.id,
            tab.label,
            tab.url.as_deref().unwrap_or("(home)")
        );
    }
}

#[cfg(not(feature = "gui"))]
fn demo_settings(app: &cyberbrowser::app::App) {
    use cyberbrowser::services::settings_engine::SettingsEngineTrait;
    section("Settings");

    let settings = app.settings();
    println!("  Config file: {}", app.settings_engine.get_config_path());
    println!("  Homepage: {}", settings.general.homepage);
    println!("  Search engine: {}", settings.general.default_search_engine);
    println!(
        "  Tor directory: {}",
        settings
            .proxy
            .executable_dir
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(not configured)".to_string())
    );
    println!();
}

#[cfg(not(feature = "gui"))]
fn demo_search(app: &mut cyberbrowser::app::App) {
    section("Search box");

    for input in ["openai gpt", "example.com", "https://www.rust-lang.org", ""] {
        match app.submit_search(input) {
            Ok(nav) => println!("  {:<28} → {}", format!("{:?}", input), nav.url),
            Err(e) => println!("  {:<28} → error: {}", format!("{:?}", input), e),
        }
    }
    println!();
}

#[cfg(not(feature = "gui"))]
fn demo_tabs(app: &mut cyberbrowser::app::App) {
    use cyberbrowser::managers::tab_registry::TabRegistryTrait;
    section("Tab strip");

    let plus = app.tabs.affordance_position();
    if let Ok(id) = app.select_position(plus) {
        println!("  Clicked \"+\" → created tab #{}", id);
    }
    app.new_tab();
    if let Ok(nav) = app.submit_search("a very long search query about tor") {
        app.on_title_changed(nav.tab, "A very long page title indeed");
    }
    print_tabs(app);

    if app.move_tab(app.tabs.tab_count() - 1, 0).is_ok() {
        println!("  Moved last tab to the front:");
        print_tabs(app);
    }
    println!();
}

#[cfg(not(feature = "gui"))]
fn demo_proxy(app: &mut cyberbrowser::app::App) {
    section("Tor proxy");

    if let Err(e) = app.set_proxy_enabled(true) {
        println!("  Enable failed: {}", e);
        return;
    }
    match app.wait_proxy_status(std::time::Duration::from_secs(35)) {
        Some(status) => println!(
            "  running={} reason=\"{}\" enabled={}",
            status.running,
            status.reason,
            app.settings().proxy.enabled
        ),
        None => println!("  No status reported"),
    }
    if app.is_proxy_running() {
        let _ = app.set_proxy_enabled(false);
        let _ = app.wait_proxy_status(std::time::Duration::from_secs(15));
        println!("  Tor stopped");
    }
    println!();
}

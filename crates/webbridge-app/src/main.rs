mod app;
mod cli;
mod demo;

use std::path::Path;

use tracing_subscriber::EnvFilter;
use webbridge_config::{BridgeConfig, LogLevel};
use winit::event_loop::EventLoop;

/// Explicit `--config` path, else the platform default. Either must pass
/// validation; anything else falls back to defaults.
fn load_config(path: Option<&str>) -> BridgeConfig {
    let loaded = match path {
        Some(p) => webbridge_config::load_config_from(Path::new(p)),
        None => webbridge_config::load_config(),
    };
    loaded.unwrap_or_else(|e| {
        tracing::warn!("Config load failed, using defaults: {e}");
        BridgeConfig::default()
    })
}

/// Config level before the config is known; `--log-level` wins afterwards.
fn peek_log_level(path: Option<&str>) -> LogLevel {
    path.and_then(|p| webbridge_config::load_from_path(Path::new(p)).ok())
        .or_else(|| {
            let default = webbridge_config::default_config_path().ok()?;
            webbridge_config::load_from_path(&default).ok()
        })
        .map(|c| c.logging.level)
        .unwrap_or_default()
}

fn main() {
    let args = cli::parse();

    let log_directive = match args.log_level.as_deref() {
        Some(level) => cli::log_directive(level),
        None => peek_log_level(args.config.as_deref()).directive().to_string(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                log_directive
                    .parse()
                    .unwrap_or_else(|_| LogLevel::default().directive().parse().unwrap()),
            ),
        )
        .init();

    tracing::info!("WebBridge v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Some(ref path) = args.config {
        tracing::info!("Using config override: {path}");
    }
    let mut config = load_config(args.config.as_deref());
    if let Some(url) = args.url {
        config.webview.start_url = url;
    }
    if let Some(assets) = args.assets {
        config.webview.assets_dir = assets;
    }

    if args.print_config {
        println!("{}", webbridge_config::config_to_json(&config));
        return;
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to start async runtime: {e}");
            return;
        }
    };

    let event_loop = match EventLoop::<app::Wake>::with_user_event().build() {
        Ok(el) => el,
        Err(e) => {
            tracing::error!("Failed to create event loop: {e}");
            return;
        }
    };
    let mut app = app::BridgeApp::new(config, runtime.handle().clone(), event_loop.create_proxy());

    tracing::info!("Entering event loop");
    if let Err(e) = event_loop.run_app(&mut app) {
        tracing::error!("Event loop error: {e}");
    }
    tracing::info!("Shutdown complete");
}

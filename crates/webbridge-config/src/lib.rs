//! WebBridge configuration.
//!
//! TOML-based configuration for the bridge protocol names, the embedded web
//! view, and logging. Every section has defaults so partial files work.
//!
//! ```rust,no_run
//! use webbridge_config::load_config;
//!
//! let config = load_config().expect("failed to load config");
//! println!("{}", config.bridge.entry_point);
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{BridgeConfig, BridgeSection, LogLevel, LoggingConfig, SendPolicy, WebViewSection};
pub use toml_loader::{default_config_path, load_default, load_from_path};

use std::path::Path;

use webbridge_common::ConfigError;

/// Load config from the platform default path and validate it.
pub fn load_config() -> Result<BridgeConfig, ConfigError> {
    let config = toml_loader::load_default()?;
    validation::validate(&config)?;
    Ok(config)
}

/// Load config from an explicit path and validate it.
///
/// Unlike [`load_from_path`], a config that fails validation is an error:
/// its names end up spliced into page scripts.
pub fn load_config_from(path: &Path) -> Result<BridgeConfig, ConfigError> {
    let config = toml_loader::load_from_path(path)?;
    validation::validate(&config)?;
    Ok(config)
}

/// Serialize a config to pretty-printed JSON (for `--print-config`).
pub fn config_to_json(config: &BridgeConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}

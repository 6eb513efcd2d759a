//! Configuration validation.
//!
//! Collects every problem into a single `ConfigError::ValidationError`.

use regex::Regex;
use std::sync::OnceLock;
use webbridge_common::ConfigError;

use crate::schema::BridgeConfig;

fn js_identifier() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("static regex"))
}

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &BridgeConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();
    let bridge = &config.bridge;

    for (name, value) in [
        ("bridge.entry_point", &bridge.entry_point),
        ("bridge.entry_method", &bridge.entry_method),
        ("bridge.inbound_callback", &bridge.inbound_callback),
    ] {
        if !js_identifier().is_match(value) {
            errors.push(format!("{name} = {value:?} is not a JavaScript identifier"));
        }
    }

    if bridge.max_queued < 1 || bridge.max_queued > 65_536 {
        errors.push(format!(
            "bridge.max_queued = {} is out of range [1, 65536]",
            bridge.max_queued
        ));
    }

    if bridge.request_id_prefix.is_empty() {
        errors.push("bridge.request_id_prefix must not be empty".into());
    }

    if config.webview.start_url.trim().is_empty() {
        errors.push("webview.start_url must not be empty".into());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

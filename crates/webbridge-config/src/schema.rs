//! Configuration types.

use serde::{Deserialize, Serialize};

/// What an outbound send does before the page has finished loading.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SendPolicy {
    /// Hold messages and flush them once the page reports `Finished`.
    #[default]
    Queue,
    /// Discard messages sent before load, logging each one.
    Drop,
}

/// Protocol names shared with the embedded page, plus channel behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSection {
    /// JS global object the page calls into (`window.<entry_point>`).
    pub entry_point: String,
    /// Method on the entry point taking one JSON string.
    pub entry_method: String,
    /// JS function invoked with every native -> web envelope.
    pub inbound_callback: String,
    pub send_before_load: SendPolicy,
    /// Queue capacity; the oldest message is dropped when full.
    pub max_queued: u32,
    pub request_id_prefix: String,
}

impl Default for BridgeSection {
    fn default() -> Self {
        Self {
            entry_point: "MessageBridge".into(),
            entry_method: "sendMessageToApp".into(),
            inbound_callback: "onAppMessage".into(),
            send_before_load: SendPolicy::Queue,
            max_queued: 256,
            request_id_prefix: "req_".into(),
        }
    }
}

/// Embedded web view settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebViewSection {
    pub start_url: String,
    /// Directory served under `webbridge://localhost/`.
    pub assets_dir: String,
    pub devtools: bool,
    pub user_agent: Option<String>,
    pub transparent: bool,
}

impl Default for WebViewSection {
    fn default() -> Self {
        Self {
            start_url: "webbridge://localhost/index.html".into(),
            assets_dir: "assets".into(),
            devtools: cfg!(debug_assertions),
            user_agent: Some("WebBridge/0.1".into()),
            transparent: false,
        }
    }
}

/// Log level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// `EnvFilter` directive for the webbridge crates.
    pub fn directive(self) -> &'static str {
        match self {
            LogLevel::Trace => "webbridge=trace",
            LogLevel::Debug => "webbridge=debug",
            LogLevel::Info => "webbridge=info",
            LogLevel::Warn => "webbridge=warn",
            LogLevel::Error => "webbridge=error",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
}

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BridgeConfig {
    pub bridge: BridgeSection,
    pub webview: WebViewSection,
    pub logging: LoggingConfig,
}

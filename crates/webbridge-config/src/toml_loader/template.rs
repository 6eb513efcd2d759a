/// Commented default config written on first run.
pub(super) const DEFAULT_CONFIG_TOML: &str = r#"# WebBridge configuration

[bridge]
# JS global the page calls into: window.MessageBridge.sendMessageToApp(json)
entry_point = "MessageBridge"
entry_method = "sendMessageToApp"
# JS function receiving native -> web envelopes: window.onAppMessage({type, data})
inbound_callback = "onAppMessage"
# Sends issued before the page finished loading: "queue" or "drop"
send_before_load = "queue"
max_queued = 256
request_id_prefix = "req_"

[webview]
start_url = "webbridge://localhost/index.html"
assets_dir = "assets"
devtools = false
user_agent = "WebBridge/0.1"
transparent = false

[logging]
# trace | debug | info | warn | error
level = "info"
"#;

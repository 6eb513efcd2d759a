//! JavaScript snippets evaluated in the embedded page.
//!
//! Names interpolated here (callback, entry point, method) come from
//! validated config and must be plain JS identifiers. Envelope JSON is
//! embedded as an object literal, never as a quoted string.

/// JSON is a JS expression except for U+2028/U+2029 in older engines.
fn json_as_js(wire: &str) -> String {
    wire.replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}

/// Script that hands one encoded envelope to the page's inbound callback.
///
/// Missing callbacks are skipped silently on the JS side.
pub fn dispatch_envelope(callback: &str, wire: &str) -> String {
    format!(
        "if (typeof window.{callback} === 'function') {{ window.{callback}({}); }}",
        json_as_js(wire)
    )
}

/// Script that defines `window.<entry_point>.<method>(json)` forwarding to
/// the host's raw post function (e.g. `window.ipc.postMessage`).
///
/// Objects passed instead of strings are stringified first so pages may call
/// either `sendMessageToApp(JSON.stringify(msg))` or `sendMessageToApp(msg)`.
pub fn install_entry_point(entry_point: &str, method: &str, post_fn: &str) -> String {
    format!(
        r#"(function() {{
    if (window.{entry_point}) {{ return; }}
    Object.defineProperty(window, '{entry_point}', {{
        configurable: true,
        value: Object.freeze({{
            {method}: function(message) {{
                var body = typeof message === 'string' ? message : JSON.stringify(message);
                {post_fn}(body);
            }}
        }})
    }});
}})();"#
    )
}

/// Script that removes the entry point installed by [`install_entry_point`].
pub fn remove_entry_point(entry_point: &str) -> String {
    format!("delete window.{entry_point};")
}

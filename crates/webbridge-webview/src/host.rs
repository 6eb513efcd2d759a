//! `HostSurface` over a `wry::WebView`.

use webbridge_common::BridgeError;
use webbridge_core::{script, HostSurface};
use wry::WebView;

/// JS function that hands a string to the native IPC handler.
pub const IPC_POST_FN: &str = "window.ipc.postMessage";

/// An embedded web view acting as a bridge host surface.
pub struct WebViewHost {
    pub(crate) webview: WebView,
}

impl WebViewHost {
    /// Position and size within the parent window.
    pub fn set_bounds(&self, bounds: wry::Rect) -> Result<(), wry::Error> {
        self.webview.set_bounds(bounds)
    }

    /// No-op unless devtools were enabled at build time.
    pub fn open_devtools(&self) {
        self.webview.open_devtools();
    }
}

fn script_error(e: wry::Error) -> BridgeError {
    BridgeError::Script(e.to_string())
}

impl HostSurface for WebViewHost {
    fn evaluate_script(&self, js: &str) -> Result<(), BridgeError> {
        self.webview.evaluate_script(js).map_err(script_error)
    }

    /// The entry point is also part of the initialization script, so every
    /// later document load gets it too.
    fn install_entry_point(&self, name: &str, method: &str) -> Result<(), BridgeError> {
        self.evaluate_script(&script::install_entry_point(name, method, IPC_POST_FN))
    }

    fn remove_entry_point(&self, name: &str) -> Result<(), BridgeError> {
        self.evaluate_script(&script::remove_entry_point(name))
    }
}

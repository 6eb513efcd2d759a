//! `wry` host surface for the bridge.
//!
//! - Builds the embedded web view with the page entry point pre-installed
//! - Forwards IPC and page-load callbacks through a session `Mailbox`
//! - Serves bundled assets over `webbridge://`
//! - Restricts navigation to an allowlist

pub mod builder;
pub mod content;
pub mod host;
pub mod navigation;

pub use builder::{build_host, page_load_state, HostOptions, WebViewError};
pub use content::ContentProvider;
pub use host::WebViewHost;
pub use navigation::NavigationPolicy;

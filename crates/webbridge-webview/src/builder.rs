//! Building the web view and wiring renderer callbacks to a session mailbox.
//!
//! Every wry callback only posts to the [`Mailbox`]; session state is
//! touched later, on the owner thread, by `BridgeSession::pump`.

use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};
use webbridge_config::BridgeConfig;
use webbridge_core::{script, Mailbox, PageLoadState};
use wry::http::Response;
use wry::raw_window_handle::HasWindowHandle;
use wry::{PageLoadEvent, WebViewBuilder};

use crate::content::{request_path, ContentProvider, SCHEME};
use crate::host::{WebViewHost, IPC_POST_FN};
use crate::navigation::NavigationPolicy;

#[derive(Debug, Error)]
pub enum WebViewError {
    #[error("failed to build web view: {0}")]
    Build(#[from] wry::Error),
}

/// Everything needed to build the bridge web view.
#[derive(Debug, Clone)]
pub struct HostOptions {
    pub start_url: String,
    pub assets_dir: PathBuf,
    pub devtools: bool,
    pub user_agent: Option<String>,
    pub transparent: bool,
    pub entry_point: String,
    pub entry_method: String,
}

impl HostOptions {
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self {
            start_url: config.webview.start_url.clone(),
            assets_dir: PathBuf::from(&config.webview.assets_dir),
            devtools: config.webview.devtools,
            user_agent: config.webview.user_agent.clone(),
            transparent: config.webview.transparent,
            entry_point: config.bridge.entry_point.clone(),
            entry_method: config.bridge.entry_method.clone(),
        }
    }

    /// Script run before any page script on every document load.
    pub fn initialization_script(&self) -> String {
        script::install_entry_point(&self.entry_point, &self.entry_method, IPC_POST_FN)
    }
}

pub fn page_load_state(event: PageLoadEvent) -> PageLoadState {
    match event {
        PageLoadEvent::Started => PageLoadState::Started,
        PageLoadEvent::Finished => PageLoadState::Finished,
    }
}

/// Build the web view as a child of `window`, posting page traffic to
/// `mailbox`.
pub fn build_host<W: HasWindowHandle>(
    window: &W,
    bounds: wry::Rect,
    options: &HostOptions,
    mailbox: Mailbox,
) -> Result<WebViewHost, WebViewError> {
    let init_script = options.initialization_script();

    let mut builder = WebViewBuilder::new()
        .with_bounds(bounds)
        .with_transparent(options.transparent)
        .with_devtools(options.devtools)
        .with_initialization_script(&init_script);

    if let Some(ua) = &options.user_agent {
        builder = builder.with_user_agent(ua);
    }

    builder = attach_ipc_handler(builder, mailbox.clone());
    builder = attach_page_load_handler(builder, mailbox);
    builder = attach_navigation_handler(builder, NavigationPolicy::for_start_url(&options.start_url));

    if !options.assets_dir.is_dir() {
        warn!(
            path = %options.assets_dir.display(),
            "assets directory not found, bundled content unavailable"
        );
    }
    builder = attach_custom_protocol(builder, Arc::new(ContentProvider::new(&options.assets_dir)));

    let webview = builder.with_url(&options.start_url).build_as_child(window)?;
    debug!(url = %options.start_url, "web view created");

    Ok(WebViewHost { webview })
}

fn attach_ipc_handler(builder: WebViewBuilder<'_>, mailbox: Mailbox) -> WebViewBuilder<'_> {
    builder.with_ipc_handler(move |request| {
        let body = request.body().to_string();
        debug!(body_len = body.len(), "message from page");
        mailbox.post_inbound(body);
    })
}

fn attach_page_load_handler(builder: WebViewBuilder<'_>, mailbox: Mailbox) -> WebViewBuilder<'_> {
    builder.with_on_page_load_handler(move |event, url| {
        let state = page_load_state(event);
        debug!(?state, url = %url, "page load");
        mailbox.post_page_load(state);
    })
}

fn attach_navigation_handler(
    builder: WebViewBuilder<'_>,
    policy: NavigationPolicy,
) -> WebViewBuilder<'_> {
    builder.with_navigation_handler(move |url| {
        let allowed = policy.is_allowed(&url);
        if allowed {
            debug!(url = %url, "navigation allowed");
        } else {
            warn!(url = %url, "navigation blocked: URL not in allowlist");
        }
        allowed
    })
}

fn attach_custom_protocol(
    builder: WebViewBuilder<'_>,
    provider: Arc<ContentProvider>,
) -> WebViewBuilder<'_> {
    builder.with_custom_protocol(SCHEME.to_string(), move |_webview_id, request| {
        let uri = request.uri().to_string();
        let path = request_path(&uri);
        match provider.resolve(path) {
            Some((mime, data)) => respond(200, &mime, data.into_owned()),
            None => {
                warn!(path = %path, "custom protocol: asset not found");
                respond(404, "text/plain", b"Not Found".to_vec())
            }
        }
    })
}

fn respond(status: u16, mime: &str, body: Vec<u8>) -> Response<Cow<'static, [u8]>> {
    Response::builder()
        .status(status)
        .header("Content-Type", mime)
        .header("Access-Control-Allow-Origin", "webbridge://localhost")
        .body(Cow::from(body))
        .unwrap_or_else(|e| {
            warn!(error = %e, "failed to build protocol response");
            Response::new(Cow::Borrowed(&[][..]))
        })
}

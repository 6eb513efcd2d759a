//! Window, web view and bridge session wiring for the winit event loop.

use std::rc::Rc;
use std::sync::Mutex;

use chrono::Utc;
use tokio::runtime::Handle;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoopProxy};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowAttributes, WindowId};

use webbridge_config::BridgeConfig;
use webbridge_core::{
    BridgeSession, CapabilityAck, CapabilityReport, HostSurface, MessageListener, SessionConfig,
};
use webbridge_webview::{build_host, HostOptions, WebViewHost};

use crate::demo::{demo_kind, demo_payload, request_page_info, DemoListener};

/// User event that wakes the loop so the session mailbox gets pumped.
#[derive(Debug, Clone, Copy)]
pub struct Wake;

/// Capability the demo page cannot work without.
const BUNDLED_CONTENT: &str = "bundled-content";

pub struct BridgeApp {
    config: BridgeConfig,
    options: HostOptions,
    runtime: Handle,
    proxy: EventLoopProxy<Wake>,
    window: Option<Window>,
    host: Option<Rc<WebViewHost>>,
    session: Option<BridgeSession>,
    sent: usize,
}

impl BridgeApp {
    pub fn new(config: BridgeConfig, runtime: Handle, proxy: EventLoopProxy<Wake>) -> Self {
        let options = HostOptions::from_config(&config);
        Self {
            config,
            options,
            runtime,
            proxy,
            window: None,
            host: None,
            session: None,
            sent: 0,
        }
    }

    fn check_capabilities(&self) -> CapabilityAck {
        let remote = !self.options.start_url.starts_with("webbridge://");
        let assets = &self.options.assets_dir;
        CapabilityReport::evaluate([BUNDLED_CONTENT], |_| remote || assets.is_dir()).acknowledge()
    }

    /// Create the window, the web view and an attached session.
    fn initialize(&mut self, event_loop: &ActiveEventLoop) -> bool {
        let attrs = WindowAttributes::default()
            .with_title("WebBridge")
            .with_inner_size(winit::dpi::LogicalSize::new(1024.0, 768.0));
        let window = match event_loop.create_window(attrs) {
            Ok(w) => w,
            Err(e) => {
                tracing::error!("Failed to create window: {e}");
                return false;
            }
        };

        let ack = self.check_capabilities();
        let session = BridgeSession::new(SessionConfig::from(&self.config.bridge));

        let proxy = Mutex::new(self.proxy.clone());
        let mailbox = session.mailbox().with_waker(move || {
            if let Ok(proxy) = proxy.lock() {
                let _ = proxy.send_event(Wake);
            }
        });

        let host = match build_host(&window, window_bounds(&window), &self.options, mailbox.clone()) {
            Ok(h) => Rc::new(h),
            Err(e) => {
                tracing::error!("Failed to create web view: {e}");
                return false;
            }
        };

        let surface: Rc<dyn HostSurface> = host.clone();
        if let Err(e) = session.attach(surface, &ack) {
            tracing::error!("Failed to attach bridge session: {e}");
            return false;
        }

        let listener: Rc<dyn MessageListener> =
            Rc::new(DemoListener::new(mailbox, self.runtime.clone()));
        session.add_listener(listener);

        tracing::info!(
            url = %self.options.start_url,
            session = %session.id(),
            "bridge ready (Space/Enter sends a demo message, R asks the page for its info, F12 opens devtools)"
        );
        self.window = Some(window);
        self.host = Some(host);
        self.session = Some(session);
        true
    }

    /// Independent trigger: cycles through the demo envelope types.
    fn send_demo_message(&mut self) {
        let Some(session) = &self.session else {
            return;
        };
        let kind = demo_kind(self.sent);
        match session.send(kind, Some(demo_payload(kind, Utc::now()))) {
            Ok(outcome) => {
                self.sent += 1;
                tracing::info!(kind, ?outcome, "sent demo message");
            }
            Err(e) => tracing::warn!(kind, "demo send failed: {e}"),
        }
    }

    fn request_page_info(&self) {
        let Some(session) = &self.session else {
            return;
        };
        let sent = request_page_info(session, |info| match info {
            Some(info) => tracing::info!(title = %info.title, url = %info.url, "page info received"),
            None => tracing::warn!("malformed page info reply"),
        });
        match sent {
            Ok(id) => tracing::info!(request_id = %id, "page info requested"),
            Err(e) => tracing::warn!("page info request failed: {e}"),
        }
    }

    fn handle_key(&mut self, event: KeyEvent) {
        if event.state != ElementState::Pressed || event.repeat {
            return;
        }
        match event.logical_key {
            Key::Named(NamedKey::Space) | Key::Named(NamedKey::Enter) => self.send_demo_message(),
            Key::Character(ref c) if c.eq_ignore_ascii_case("r") => self.request_page_info(),
            Key::Named(NamedKey::F12) => {
                if let Some(host) = &self.host {
                    host.open_devtools();
                }
            }
            _ => {}
        }
    }

    fn pump(&self) {
        if let Some(session) = &self.session {
            session.pump();
        }
    }

    fn shutdown(&mut self) {
        if let Some(session) = self.session.take() {
            session.detach();
        }
        self.host = None;
        self.window = None;
    }
}

fn window_bounds(window: &Window) -> wry::Rect {
    let size = window.inner_size();
    wry::Rect {
        position: wry::dpi::Position::Physical(wry::dpi::PhysicalPosition::new(0, 0)),
        size: wry::dpi::Size::Physical(wry::dpi::PhysicalSize::new(size.width, size.height)),
    }
}

impl ApplicationHandler<Wake> for BridgeApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if !self.initialize(event_loop) {
            event_loop.exit();
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, _event: Wake) {
        self.pump();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("Window close requested");
                self.shutdown();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if size.width > 0 && size.height > 0 {
                    if let (Some(window), Some(host)) = (&self.window, &self.host) {
                        if let Err(e) = host.set_bounds(window_bounds(window)) {
                            tracing::warn!("Failed to resize web view: {e}");
                        }
                    }
                }
            }
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(event),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        self.pump();
    }
}

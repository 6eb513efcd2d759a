//! `BridgeSession`: one host surface's channels, listeners and pending
//! requests.
//!
//! A session is confined to the thread that created it (it is `!Send`).
//! Work arriving from other threads goes through its [`Mailbox`] and is
//! applied by [`BridgeSession::pump`].

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, warn};
use webbridge_common::{BridgeError, DecodeError, RequestId, Result, SessionId};
use webbridge_config::{BridgeSection, SendPolicy};

use crate::channel::{InboundChannel, OutboundChannel, SendOutcome};
use crate::correlation::{Continuation, Correlator, PendingRequest, RequestStatus};
use crate::host::HostSurface;
use crate::listener::{ListenerRegistry, MessageListener};
use crate::mailbox::Mailbox;
use crate::results::ResultRouter;

mod lifecycle;
mod routing;

pub use routing::Routed;

#[cfg(test)]
mod tests;

/// Protocol names and channel behaviour for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub entry_point: String,
    pub entry_method: String,
    pub inbound_callback: String,
    pub send_before_load: SendPolicy,
    pub max_queued: usize,
    pub request_id_prefix: String,
}

impl From<&BridgeSection> for SessionConfig {
    fn from(section: &BridgeSection) -> Self {
        Self {
            entry_point: section.entry_point.clone(),
            entry_method: section.entry_method.clone(),
            inbound_callback: section.inbound_callback.clone(),
            send_before_load: section.send_before_load,
            max_queued: section.max_queued as usize,
            request_id_prefix: section.request_id_prefix.clone(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from(&BridgeSection::default())
    }
}

/// `Unattached -> Attached -> Detached`. `Detached` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unattached,
    Attached,
    Detached,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Unattached => "unattached",
            SessionState::Attached => "attached",
            SessionState::Detached => "detached",
        }
    }
}

struct Inner {
    id: SessionId,
    config: SessionConfig,
    state: Cell<SessionState>,
    inbound: InboundChannel,
    host: RefCell<Option<Rc<dyn HostSurface>>>,
    outbound: RefCell<Option<OutboundChannel>>,
    listeners: RefCell<ListenerRegistry>,
    correlator: RefCell<Correlator>,
    results: RefCell<ResultRouter>,
    mailbox: Mailbox,
}

/// Cheap, cloneable handle to a session.
///
/// Listeners and continuations may hold a clone and call back into the
/// session; no internal borrow is held while they run. `detach` drops all
/// of them, which breaks any reference cycle they form.
#[derive(Clone)]
pub struct BridgeSession {
    inner: Rc<Inner>,
}

impl BridgeSession {
    pub fn new(config: SessionConfig) -> Self {
        let inbound = InboundChannel::new(&config.entry_point, &config.entry_method);
        let correlator = Correlator::new(&config.request_id_prefix);
        let session = Self {
            inner: Rc::new(Inner {
                id: SessionId::new(),
                state: Cell::new(SessionState::Unattached),
                inbound,
                host: RefCell::new(None),
                outbound: RefCell::new(None),
                listeners: RefCell::new(ListenerRegistry::new()),
                correlator: RefCell::new(correlator),
                results: RefCell::new(ResultRouter::new()),
                mailbox: Mailbox::new(),
                config,
            }),
        };
        debug!(session = %session.id(), "session created");
        session
    }

    pub fn id(&self) -> &SessionId {
        &self.inner.id
    }

    pub fn state(&self) -> SessionState {
        self.inner.state.get()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Handle for posting work from other threads.
    pub fn mailbox(&self) -> Mailbox {
        self.inner.mailbox.clone()
    }

    fn require_attached(&self) -> Result<()> {
        match self.state() {
            SessionState::Attached => Ok(()),
            other => Err(BridgeError::ChannelUnavailable {
                state: other.as_str(),
            }),
        }
    }

    // -- listeners --

    /// Register a listener. Returns `false` if it was already registered or
    /// the session has detached.
    pub fn add_listener(&self, listener: Rc<dyn MessageListener>) -> bool {
        if self.state() == SessionState::Detached {
            debug!("listener not added: session detached");
            return false;
        }
        self.inner.listeners.borrow_mut().add(listener)
    }

    /// Unregister a listener. Unknown listeners are ignored.
    pub fn remove_listener(&self, listener: &Rc<dyn MessageListener>) -> bool {
        self.inner.listeners.borrow_mut().remove(listener)
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    // -- native -> web --

    /// Fire-and-forget send to the page.
    ///
    /// Fails with `ChannelUnavailable` before attach or after detach.
    pub fn send(&self, kind: &str, payload: Option<Value>) -> Result<SendOutcome> {
        self.require_attached()?;
        if kind.is_empty() {
            return Err(DecodeError::EmptyType.into());
        }
        let mut outbound = self.inner.outbound.borrow_mut();
        let channel = outbound.as_mut().ok_or(BridgeError::ChannelUnavailable {
            state: SessionState::Attached.as_str(),
        })?;
        channel.send(kind, payload.as_ref())
    }

    /// Send a request expecting a reply. The reply is routed to listeners
    /// like any other inbound message.
    pub fn send_request(&self, kind: &str, payload: Option<Value>) -> Result<RequestId> {
        self.dispatch_request(kind, payload, None)
    }

    /// Send a request whose reply goes to `on_reply` instead of listeners.
    pub fn send_request_with<F>(
        &self,
        kind: &str,
        payload: Option<Value>,
        on_reply: F,
    ) -> Result<RequestId>
    where
        F: FnOnce(Option<Value>) + 'static,
    {
        self.dispatch_request(kind, payload, Some(Box::new(on_reply)))
    }

    fn dispatch_request(
        &self,
        kind: &str,
        payload: Option<Value>,
        continuation: Option<Continuation>,
    ) -> Result<RequestId> {
        self.require_attached()?;
        if kind.is_empty() {
            return Err(DecodeError::EmptyType.into());
        }

        let (id, payload) = self
            .inner
            .correlator
            .borrow_mut()
            .register(kind, payload, continuation)?;

        match self.send(kind, Some(payload)) {
            Ok(SendOutcome::Dropped) => {
                warn!(request_id = %id, "request dropped before page load, abandoned");
                self.abandon(&id);
                Ok(id)
            }
            Ok(_) => Ok(id),
            Err(e) => {
                self.abandon(&id);
                Err(e)
            }
        }
    }

    // -- correlation --

    /// Forget a pending request locally. A late reply is then treated as
    /// unsolicited. Returns `false` if the request was not pending.
    pub fn abandon(&self, id: &RequestId) -> bool {
        self.inner.correlator.borrow_mut().abandon(id).is_some()
    }

    pub fn request_status(&self, id: &RequestId) -> Option<RequestStatus> {
        self.inner.correlator.borrow().status(id)
    }

    pub fn pending_request(&self, id: &RequestId) -> Option<PendingRequest> {
        self.inner.correlator.borrow().get(id).cloned()
    }

    pub fn pending_count(&self) -> usize {
        self.inner.correlator.borrow().pending_count()
    }
}

//! Marshaling onto the session's owner thread.
//!
//! Renderer callbacks and timers may fire on other threads. They never touch
//! session state directly; they post a `BridgeEvent` here and the owner
//! thread drains the mailbox with `BridgeSession::pump`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// State of a page load lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageLoadState {
    /// Navigation has started.
    Started,
    /// Page has fully loaded.
    Finished,
}

/// Work for the owner thread.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEvent {
    /// Raw body the page passed to the entry point.
    Inbound { body: String },
    PageLoad(PageLoadState),
    /// Outbound send requested off-thread (e.g. a delayed reply).
    Send { kind: String, payload: Option<Value> },
    /// Completion of an externally owned flow.
    ExternalResult {
        flow_code: i32,
        result_code: i32,
        data: Option<Value>,
    },
    /// The host surface is going away.
    SurfaceClosed,
}

type Waker = Arc<dyn Fn() + Send + Sync>;

/// Thread-safe, cloneable handle for posting events to a session.
#[derive(Clone)]
pub struct Mailbox {
    events: Arc<Mutex<Vec<BridgeEvent>>>,
    closed: Arc<AtomicBool>,
    waker: Option<Waker>,
}

impl Mailbox {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            closed: Arc::new(AtomicBool::new(false)),
            waker: None,
        }
    }

    /// Same mailbox, calling `waker` after every post (e.g. to wake an
    /// event loop blocked in `Wait`).
    pub fn with_waker(&self, waker: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            events: Arc::clone(&self.events),
            closed: Arc::clone(&self.closed),
            waker: Some(Arc::new(waker)),
        }
    }

    /// Queue an event. Returns `false` once the session has detached.
    pub fn post(&self, event: BridgeEvent) -> bool {
        if self.is_closed() {
            debug!(?event, "mailbox closed, event discarded");
            return false;
        }
        self.queue().push(event);
        if let Some(waker) = &self.waker {
            waker();
        }
        true
    }

    pub fn post_inbound(&self, body: impl Into<String>) -> bool {
        self.post(BridgeEvent::Inbound { body: body.into() })
    }

    pub fn post_page_load(&self, state: PageLoadState) -> bool {
        self.post(BridgeEvent::PageLoad(state))
    }

    pub fn post_send(&self, kind: impl Into<String>, payload: Option<Value>) -> bool {
        self.post(BridgeEvent::Send {
            kind: kind.into(),
            payload,
        })
    }

    pub fn post_result(&self, flow_code: i32, result_code: i32, data: Option<Value>) -> bool {
        self.post(BridgeEvent::ExternalResult {
            flow_code,
            result_code,
            data,
        })
    }

    /// Take every queued event, oldest first.
    pub fn drain(&self) -> Vec<BridgeEvent> {
        std::mem::take(&mut *self.queue())
    }

    /// The queue survives a poster panicking mid-push; a `Vec` push leaves
    /// nothing half-written.
    fn queue(&self) -> MutexGuard<'_, Vec<BridgeEvent>> {
        match self.events.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.drain();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new()
    }
}

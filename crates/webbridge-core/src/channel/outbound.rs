use std::collections::VecDeque;
use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, warn};
use webbridge_common::BridgeError;
use webbridge_config::SendPolicy;

use crate::envelope::encode;
use crate::host::HostSurface;
use crate::script::dispatch_envelope;

use super::SendOutcome;

/// Native -> web channel.
///
/// Sends made before the page reports `Finished` are queued (bounded, oldest
/// dropped first) or discarded, depending on the policy.
pub struct OutboundChannel {
    host: Rc<dyn HostSurface>,
    callback: String,
    policy: SendPolicy,
    max_queued: usize,
    loaded: bool,
    queue: VecDeque<String>,
}

impl OutboundChannel {
    pub fn new(
        host: Rc<dyn HostSurface>,
        callback: impl Into<String>,
        policy: SendPolicy,
        max_queued: usize,
    ) -> Self {
        Self {
            host,
            callback: callback.into(),
            policy,
            max_queued: max_queued.max(1),
            loaded: false,
            queue: VecDeque::new(),
        }
    }

    pub fn send(&mut self, kind: &str, payload: Option<&Value>) -> Result<SendOutcome, BridgeError> {
        let wire = encode(kind, payload);

        if self.loaded {
            self.deliver(&wire)?;
            debug!(kind, "message delivered to page");
            return Ok(SendOutcome::Delivered);
        }

        match self.policy {
            SendPolicy::Queue => {
                if self.queue.len() >= self.max_queued {
                    self.queue.pop_front();
                    warn!(max_queued = self.max_queued, "outbound queue full, dropped oldest");
                }
                self.queue.push_back(wire);
                debug!(kind, queued = self.queue.len(), "page not loaded, message queued");
                Ok(SendOutcome::Queued)
            }
            SendPolicy::Drop => {
                warn!(kind, "page not loaded, message dropped");
                Ok(SendOutcome::Dropped)
            }
        }
    }

    /// A new document started loading; hold sends until it finishes.
    pub fn mark_loading(&mut self) {
        self.loaded = false;
    }

    /// The page finished loading. Flushes the queue in order and returns
    /// how many messages were delivered.
    pub fn mark_loaded(&mut self) -> usize {
        self.loaded = true;
        let mut delivered = 0;
        while let Some(wire) = self.queue.pop_front() {
            match self.deliver(&wire) {
                Ok(()) => delivered += 1,
                Err(e) => warn!(error = %e, "failed to flush queued message"),
            }
        }
        if delivered > 0 {
            debug!(delivered, "flushed queued messages");
        }
        delivered
    }

    fn deliver(&self, wire: &str) -> Result<(), BridgeError> {
        self.host
            .evaluate_script(&dispatch_envelope(&self.callback, wire))
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }
}

use tracing::{debug, warn};
use webbridge_common::RequestId;

use crate::envelope::Envelope;
use crate::mailbox::{BridgeEvent, PageLoadState};

use super::{BridgeSession, SessionState};

/// What happened to one inbound body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    /// Matched a pending request. The continuation ran if there was one,
    /// otherwise listeners received the reply.
    Completed(RequestId),
    /// No matching request; delivered to listeners.
    Unsolicited,
    /// Malformed body, logged and dropped.
    Rejected,
    /// The session was not attached.
    Ignored,
}

impl BridgeSession {
    /// Web -> native entry: decode one body from the page and route it.
    pub fn receive(&self, body: &str) -> Routed {
        let state = self.state();
        if state != SessionState::Attached {
            debug!(state = state.as_str(), body_len = body.len(), "inbound message ignored");
            return Routed::Ignored;
        }
        match self.inner.inbound.receive(body) {
            Ok(env) => self.route(env),
            Err(_) => Routed::Rejected,
        }
    }

    fn route(&self, env: Envelope) -> Routed {
        let resolved = self
            .inner
            .correlator
            .borrow_mut()
            .resolve(env.payload.as_ref());

        let Some(resolved) = resolved else {
            if let Some(id) = env.request_id() {
                debug!(request_id = id, kind = %env.kind, "unmatched reply");
            }
            self.dispatch(&env);
            return Routed::Unsolicited;
        };

        let id = resolved.request.id;
        debug!(request_id = %id, kind = %env.kind, "reply matched request");
        match resolved.continuation {
            Some(continuation) => continuation(resolved.reply),
            None => self.dispatch(&env),
        }
        Routed::Completed(id)
    }

    fn dispatch(&self, env: &Envelope) {
        let snapshot = self.inner.listeners.borrow().snapshot();
        for listener in snapshot {
            listener.on_message(&env.kind, env.payload.as_ref());
        }
    }

    /// Renderer page-load notification. Sends are held from `Started`
    /// until `Finished`.
    pub fn on_page_load(&self, state: PageLoadState) {
        let mut outbound = self.inner.outbound.borrow_mut();
        let Some(channel) = outbound.as_mut() else {
            return;
        };
        match state {
            PageLoadState::Started => channel.mark_loading(),
            PageLoadState::Finished => {
                channel.mark_loaded();
            }
        }
    }

    /// Apply everything posted to the mailbox, oldest first. Returns the
    /// number of events handled.
    pub fn pump(&self) -> usize {
        let events = self.inner.mailbox.drain();
        let count = events.len();
        for event in events {
            self.handle_event(event);
        }
        count
    }

    fn handle_event(&self, event: BridgeEvent) {
        match event {
            BridgeEvent::Inbound { body } => {
                self.receive(&body);
            }
            BridgeEvent::PageLoad(state) => self.on_page_load(state),
            BridgeEvent::Send { kind, payload } => {
                if let Err(e) = self.send(&kind, payload) {
                    warn!(kind = %kind, error = %e, "marshaled send failed");
                }
            }
            BridgeEvent::ExternalResult {
                flow_code,
                result_code,
                data,
            } => {
                self.forward_result(flow_code, result_code, data);
            }
            BridgeEvent::SurfaceClosed => self.detach(),
        }
    }
}

use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, info, warn};
use webbridge_common::{BridgeError, Result};

use crate::capability::{CapabilityAck, CapabilityOutcome};
use crate::channel::OutboundChannel;
use crate::host::HostSurface;
use crate::results::ExternalResult;

use super::{BridgeSession, SessionState};

impl BridgeSession {
    /// Bind the session to a host surface and install the page entry point.
    ///
    /// Only valid from `Unattached`; a detached session cannot be reused.
    pub fn attach(&self, host: Rc<dyn HostSurface>, ack: &CapabilityAck) -> Result<()> {
        let state = self.state();
        if state != SessionState::Unattached {
            return Err(BridgeError::InvalidTransition {
                from: state.as_str(),
                to: SessionState::Attached.as_str(),
            });
        }

        let config = &self.inner.config;
        host.install_entry_point(&config.entry_point, &config.entry_method)?;

        let outbound = OutboundChannel::new(
            Rc::clone(&host),
            &config.inbound_callback,
            config.send_before_load,
            config.max_queued,
        );
        *self.inner.outbound.borrow_mut() = Some(outbound);
        *self.inner.host.borrow_mut() = Some(host);
        self.inner.state.set(SessionState::Attached);

        match ack.outcome() {
            CapabilityOutcome::AllGranted => info!(
                session = %self.id(),
                entry_point = %config.entry_point,
                "session attached"
            ),
            CapabilityOutcome::ProceedingWithDenials(denied) => info!(
                session = %self.id(),
                entry_point = %config.entry_point,
                ?denied,
                "session attached with denied capabilities"
            ),
        }
        Ok(())
    }

    /// Tear the session down. Safe to call any number of times, attached
    /// or not.
    ///
    /// Removes the entry point and every listener, abandons pending
    /// requests without running their continuations, and closes the
    /// mailbox.
    pub fn detach(&self) {
        let state = self.state();
        if state == SessionState::Detached {
            debug!(session = %self.id(), "detach on detached session ignored");
            return;
        }
        self.inner.state.set(SessionState::Detached);

        let host = self.inner.host.borrow_mut().take();
        if let Some(host) = host {
            if let Err(e) = host.remove_entry_point(&self.inner.config.entry_point) {
                warn!(error = %e, "failed to remove entry point");
            }
        }

        let outbound = self.inner.outbound.borrow_mut().take();
        drop(outbound);
        self.inner.listeners.borrow_mut().clear();
        let abandoned = self.inner.correlator.borrow_mut().abandon_all();
        self.inner.results.borrow_mut().clear();
        self.inner.mailbox.close();

        info!(
            session = %self.id(),
            from = state.as_str(),
            abandoned,
            "session detached"
        );
    }

    pub fn is_attached(&self) -> bool {
        self.state() == SessionState::Attached
    }

    // -- external results --

    /// Route results of the external flow identified by `flow_code` to
    /// `handler`. Replaces any earlier handler for the same code.
    pub fn register_result_handler<F>(&self, flow_code: i32, handler: F) -> bool
    where
        F: Fn(&ExternalResult) + 'static,
    {
        if self.state() == SessionState::Detached {
            return false;
        }
        self.inner
            .results
            .borrow_mut()
            .register(flow_code, Rc::new(handler))
    }

    pub fn unregister_result_handler(&self, flow_code: i32) -> bool {
        self.inner.results.borrow_mut().unregister(flow_code)
    }

    /// Hand an external flow's completion to its registered handler.
    ///
    /// Returns `false` when no handler is registered or the session has
    /// detached.
    pub fn forward_result(&self, flow_code: i32, result_code: i32, data: Option<Value>) -> bool {
        if self.state() == SessionState::Detached {
            debug!(flow_code, "external result after detach ignored");
            return false;
        }
        let result = ExternalResult {
            flow_code,
            result_code,
            data,
        };
        let handler = self.inner.results.borrow().handler_for(&result);
        match handler {
            Some(handler) => {
                debug!(flow_code, result_code, "routing external result");
                handler(&result);
                true
            }
            None => false,
        }
    }
}

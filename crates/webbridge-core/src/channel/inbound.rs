use tracing::{debug, warn};
use webbridge_common::DecodeError;

use crate::envelope::{decode, Envelope};

/// Web -> native channel: the trust boundary for page-originated data.
///
/// Every body passes through the codec; malformed input is logged and
/// discarded with no other effect.
#[derive(Debug, Clone)]
pub struct InboundChannel {
    entry_point: String,
    entry_method: String,
}

impl InboundChannel {
    pub fn new(entry_point: impl Into<String>, entry_method: impl Into<String>) -> Self {
        Self {
            entry_point: entry_point.into(),
            entry_method: entry_method.into(),
        }
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    pub fn entry_method(&self) -> &str {
        &self.entry_method
    }

    /// Decode one wire body from the page.
    pub fn receive(&self, body: &str) -> Result<Envelope, DecodeError> {
        match decode(body) {
            Ok(env) => {
                debug!(kind = %env.kind, body_len = body.len(), "message from page");
                Ok(env)
            }
            Err(e) => {
                warn!(
                    entry_point = %self.entry_point,
                    body_len = body.len(),
                    error = %e,
                    "message from page rejected"
                );
                Err(e)
            }
        }
    }
}

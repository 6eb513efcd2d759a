//! Bidirectional message bridge between a native host and embedded web content.
//!
//! - Envelope codec for the `{type, data}` wire format
//! - Listener fan-out for web -> native messages
//! - Request/response correlation via a `requestId` payload field
//! - Native -> web channel with queue-until-loaded delivery
//! - Session lifecycle bound to one host surface
//! - A `Send` mailbox for marshaling work onto the owner thread

pub mod capability;
pub mod channel;
pub mod correlation;
pub mod envelope;
pub mod host;
pub mod listener;
pub mod mailbox;
pub mod results;
pub mod script;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use capability::{CapabilityAck, CapabilityOutcome, CapabilityReport};
pub use channel::SendOutcome;
pub use correlation::{PendingRequest, RequestStatus};
pub use envelope::{decode, encode, Envelope, REQUEST_ID_KEY};
pub use host::HostSurface;
pub use listener::{ListenerRegistry, MessageListener};
pub use mailbox::{BridgeEvent, Mailbox, PageLoadState};
pub use results::{ExternalResult, ResultRouter};
pub use session::{BridgeSession, Routed, SessionConfig, SessionState};

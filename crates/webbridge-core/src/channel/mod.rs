//! Native -> web and web -> native channels.

mod inbound;
mod outbound;

pub use inbound::InboundChannel;
pub use outbound::OutboundChannel;

/// What happened to an outbound send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Evaluated in the page.
    Delivered,
    /// Held until the page finishes loading.
    Queued,
    /// Discarded because the page was not loaded and the policy is `drop`.
    Dropped,
}

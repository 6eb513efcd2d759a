//! The seam between the bridge and whatever renders the embedded content.

use webbridge_common::BridgeError;

/// A native surface hosting embedded web content.
///
/// Implementations must be called only from the thread that owns the
/// surface; the session holding one is itself `!Send`.
pub trait HostSurface {
    /// Run a script in the page's execution context.
    fn evaluate_script(&self, script: &str) -> Result<(), BridgeError>;

    /// Expose `window.<name>.<method>(json)` to the page.
    fn install_entry_point(&self, name: &str, method: &str) -> Result<(), BridgeError>;

    /// Withdraw an entry point installed by `install_entry_point`.
    fn remove_entry_point(&self, name: &str) -> Result<(), BridgeError>;
}

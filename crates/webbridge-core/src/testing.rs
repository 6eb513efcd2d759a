//! Test doubles shared by the unit tests.

use std::cell::{Cell, RefCell};

use webbridge_common::BridgeError;

use crate::envelope::{decode, Envelope};
use crate::host::HostSurface;

/// Host surface that records every call instead of rendering anything.
#[derive(Default)]
pub(crate) struct RecordingHost {
    scripts: RefCell<Vec<String>>,
    installed: RefCell<Vec<(String, String)>>,
    removed: RefCell<Vec<String>>,
    fail: Cell<bool>,
}

impl RecordingHost {
    pub(crate) fn fail_scripts(&self, fail: bool) {
        self.fail.set(fail);
    }

    pub(crate) fn scripts(&self) -> Vec<String> {
        self.scripts.borrow().clone()
    }

    pub(crate) fn installed(&self) -> Vec<(String, String)> {
        self.installed.borrow().clone()
    }

    pub(crate) fn removed(&self) -> Vec<String> {
        self.removed.borrow().clone()
    }

    /// Envelopes delivered through `window.<callback>(...)` scripts.
    pub(crate) fn envelopes(&self) -> Vec<Envelope> {
        self.scripts
            .borrow()
            .iter()
            .filter_map(|s| {
                let start = s.find("({")? + 1;
                let end = s.rfind("});")? + 1;
                decode(&s[start..end]).ok()
            })
            .collect()
    }
}

impl HostSurface for RecordingHost {
    fn evaluate_script(&self, script: &str) -> Result<(), BridgeError> {
        if self.fail.get() {
            return Err(BridgeError::Script("renderer gone".into()));
        }
        self.scripts.borrow_mut().push(script.to_string());
        Ok(())
    }

    fn install_entry_point(&self, name: &str, method: &str) -> Result<(), BridgeError> {
        self.installed
            .borrow_mut()
            .push((name.to_string(), method.to_string()));
        Ok(())
    }

    fn remove_entry_point(&self, name: &str) -> Result<(), BridgeError> {
        self.removed.borrow_mut().push(name.to_string());
        Ok(())
    }
}

//! Capability gate checked before a session may attach.
//!
//! Acquiring capabilities (permission prompts and the like) belongs to the
//! host. The bridge only requires proof that the host has looked at the
//! outcome: every required capability is either granted, or denied and the
//! host chose to proceed anyway.

use tracing::{info, warn};

/// Outcome of the host's capability acquisition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilityReport {
    granted: Vec<String>,
    denied: Vec<String>,
}

impl CapabilityReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(mut self, name: impl Into<String>) -> Self {
        self.granted.push(name.into());
        self
    }

    pub fn deny(mut self, name: impl Into<String>) -> Self {
        self.denied.push(name.into());
        self
    }

    /// Build a report by checking each required capability.
    pub fn evaluate<I, S, F>(required: I, mut check: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: FnMut(&str) -> bool,
    {
        required.into_iter().fold(Self::new(), |report, name| {
            let name = name.into();
            if check(&name) {
                report.grant(name)
            } else {
                report.deny(name)
            }
        })
    }

    pub fn granted(&self) -> &[String] {
        &self.granted
    }

    pub fn denied(&self) -> &[String] {
        &self.denied
    }

    pub fn is_fully_granted(&self) -> bool {
        self.denied.is_empty()
    }

    /// Accept the report and proceed, with or without denials.
    pub fn acknowledge(self) -> CapabilityAck {
        if self.is_fully_granted() {
            info!(granted = self.granted.len(), "all capabilities granted");
        } else {
            warn!(denied = ?self.denied, "proceeding with denied capabilities");
        }
        CapabilityAck { report: self }
    }
}

/// Token required by `BridgeSession::attach`.
///
/// Only obtainable through [`CapabilityReport::acknowledge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityAck {
    report: CapabilityReport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityOutcome {
    AllGranted,
    ProceedingWithDenials(Vec<String>),
}

impl CapabilityAck {
    pub fn outcome(&self) -> CapabilityOutcome {
        if self.report.is_fully_granted() {
            CapabilityOutcome::AllGranted
        } else {
            CapabilityOutcome::ProceedingWithDenials(self.report.denied.clone())
        }
    }

    pub fn report(&self) -> &CapabilityReport {
        &self.report
    }
}

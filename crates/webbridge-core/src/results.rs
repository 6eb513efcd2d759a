//! Routing of externally owned flow results (e.g. a permission prompt) to
//! whichever component registered for that flow's code.

use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Completion of an external flow, forwarded by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalResult {
    pub flow_code: i32,
    pub result_code: i32,
    pub data: Option<Value>,
}

pub type ResultHandler = Rc<dyn Fn(&ExternalResult)>;

#[derive(Default)]
pub struct ResultRouter {
    handlers: HashMap<i32, ResultHandler>,
}

impl ResultRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in `flow_code`, replacing any earlier handler.
    pub fn register(&mut self, flow_code: i32, handler: ResultHandler) -> bool {
        let replaced = self.handlers.insert(flow_code, handler).is_some();
        if replaced {
            debug!(flow_code, "result handler replaced");
        }
        !replaced
    }

    pub fn unregister(&mut self, flow_code: i32) -> bool {
        self.handlers.remove(&flow_code).is_some()
    }

    /// Handler registered for the result's flow, if any.
    ///
    /// Returned rather than invoked so the caller can release its borrow
    /// first.
    pub fn handler_for(&self, result: &ExternalResult) -> Option<ResultHandler> {
        let handler = self.handlers.get(&result.flow_code).cloned();
        if handler.is_none() {
            warn!(
                flow_code = result.flow_code,
                result_code = result.result_code,
                "no handler for external result"
            );
        }
        handler
    }

    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

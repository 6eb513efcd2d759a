//! Request/response correlation.
//!
//! An outbound request carries a `requestId` inside its payload. A later
//! inbound message whose payload carries the same id resolves the request,
//! however long the reply takes. Ids are never reused within a session.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::{debug, error};
use webbridge_common::{BridgeError, RequestId, RequestIdAllocator};

use crate::envelope::{request_id_of, REQUEST_ID_KEY};

/// Called once with the reply payload (minus `requestId`).
pub type Continuation = Box<dyn FnOnce(Option<Value>)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Pending,
    Completed,
    Abandoned,
}

#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub id: RequestId,
    /// Envelope type the request was sent with.
    pub kind: String,
    pub created_at: DateTime<Utc>,
    pub status: RequestStatus,
}

struct Entry {
    request: PendingRequest,
    continuation: Option<Continuation>,
}

/// A reply matched to its request. The entry has already been removed.
pub struct Resolved {
    pub request: PendingRequest,
    pub continuation: Option<Continuation>,
    /// Reply payload with the correlation key stripped.
    pub reply: Option<Value>,
}

/// Outstanding requests for one session.
pub struct Correlator {
    ids: RequestIdAllocator,
    pending: HashMap<RequestId, Entry>,
    issued: HashSet<RequestId>,
}

impl Correlator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            ids: RequestIdAllocator::new(prefix),
            pending: HashMap::new(),
            issued: HashSet::new(),
        }
    }

    /// Register a request and return its id plus the payload to send.
    ///
    /// A string `requestId` already present in `payload` is used as-is;
    /// otherwise a fresh id is allocated and inserted. Non-object payloads
    /// cannot carry the key and are rejected.
    pub fn register(
        &mut self,
        kind: &str,
        payload: Option<Value>,
        continuation: Option<Continuation>,
    ) -> Result<(RequestId, Value), BridgeError> {
        let mut obj = match payload {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(obj)) => obj,
            Some(_) => {
                return Err(BridgeError::InvalidRequest(
                    "request payload must be a JSON object".into(),
                ))
            }
        };

        let id = match obj.get(REQUEST_ID_KEY) {
            Some(Value::String(s)) => {
                let id = RequestId::new(s.as_str());
                if self.issued.contains(&id) {
                    error!(request_id = %id, "duplicate request id supplied by caller");
                    return Err(BridgeError::DuplicateRequestId(id.to_string()));
                }
                id
            }
            Some(_) => {
                return Err(BridgeError::InvalidRequest(format!(
                    "`{REQUEST_ID_KEY}` must be a string"
                )))
            }
            None => {
                let id = self.allocate();
                obj.insert(REQUEST_ID_KEY.into(), Value::String(id.to_string()));
                id
            }
        };

        self.issued.insert(id.clone());
        self.pending.insert(
            id.clone(),
            Entry {
                request: PendingRequest {
                    id: id.clone(),
                    kind: kind.to_string(),
                    created_at: Utc::now(),
                    status: RequestStatus::Pending,
                },
                continuation,
            },
        );
        debug!(request_id = %id, kind, "request registered");
        Ok((id, Value::Object(obj)))
    }

    fn allocate(&mut self) -> RequestId {
        loop {
            let id = self.ids.next_id();
            // Skip anything a caller already claimed.
            if !self.issued.contains(&id) {
                return id;
            }
        }
    }

    /// Match an inbound payload against the pending set.
    ///
    /// Returns `None` for payloads with no `requestId`, an unknown id, or an
    /// id whose request is no longer `Pending`.
    pub fn resolve(&mut self, payload: Option<&Value>) -> Option<Resolved> {
        let id = RequestId::new(request_id_of(payload)?);
        match self.pending.get(&id) {
            Some(entry) if entry.request.status == RequestStatus::Pending => {}
            _ => return None,
        }
        let mut entry = self.pending.remove(&id)?;
        entry.request.status = RequestStatus::Completed;

        let reply = payload.and_then(Value::as_object).and_then(|obj| {
            let mut obj = obj.clone();
            obj.remove(REQUEST_ID_KEY);
            (!obj.is_empty()).then_some(Value::Object(obj))
        });

        Some(Resolved {
            request: entry.request,
            continuation: entry.continuation,
            reply,
        })
    }

    /// Drop a pending request locally; a late reply becomes unsolicited.
    pub fn abandon(&mut self, id: &RequestId) -> Option<PendingRequest> {
        let mut entry = self.pending.remove(id)?;
        entry.request.status = RequestStatus::Abandoned;
        debug!(request_id = %id, "request abandoned");
        Some(entry.request)
    }

    /// Mark every pending request `Abandoned` and drop its continuation.
    ///
    /// Entries stay visible through [`Correlator::status`].
    pub fn abandon_all(&mut self) -> usize {
        let mut count = 0;
        for entry in self.pending.values_mut() {
            if entry.request.status == RequestStatus::Pending {
                entry.request.status = RequestStatus::Abandoned;
                entry.continuation = None;
                count += 1;
            }
        }
        count
    }

    pub fn status(&self, id: &RequestId) -> Option<RequestStatus> {
        self.pending.get(id).map(|e| e.request.status)
    }

    pub fn get(&self, id: &RequestId) -> Option<&PendingRequest> {
        self.pending.get(id).map(|e| &e.request)
    }

    /// Number of requests still awaiting a reply.
    pub fn pending_count(&self) -> usize {
        self.pending
            .values()
            .filter(|e| e.request.status == RequestStatus::Pending)
            .count()
    }
}

//! Envelope codec for the bridge wire format.
//!
//! Every message crossing the native/web boundary is a single JSON string:
//!
//! ```json
//! {"type": "action", "data": {"actionType": "openNativeDialog", "requestId": "req_1"}}
//! ```
//!
//! `type` is an opaque, non-empty tag. `data` is optional and may be any JSON
//! value; an explicit `null` is treated the same as an absent payload.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use webbridge_common::DecodeError;

/// Wire key carrying the message tag.
pub const TYPE_KEY: &str = "type";
/// Wire key carrying the payload.
pub const PAYLOAD_KEY: &str = "data";
/// Payload field used to correlate a reply with its request.
pub const REQUEST_ID_KEY: &str = "requestId";

/// A `(type, payload)` unit exchanged across the bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "data", default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl Envelope {
    pub fn new(kind: impl Into<String>, payload: Option<Value>) -> Self {
        Self {
            kind: kind.into(),
            payload: payload.filter(|v| !v.is_null()),
        }
    }

    /// The `requestId` string in an object payload, if any.
    pub fn request_id(&self) -> Option<&str> {
        request_id_of(self.payload.as_ref())
    }

    pub fn to_wire(&self) -> String {
        encode(&self.kind, self.payload.as_ref())
    }
}

/// Look up the correlation key in a payload.
pub fn request_id_of(payload: Option<&Value>) -> Option<&str> {
    payload?.as_object()?.get(REQUEST_ID_KEY)?.as_str()
}

/// Serialize a `(type, payload)` pair to its wire string.
pub fn encode(kind: &str, payload: Option<&Value>) -> String {
    let mut obj = Map::new();
    obj.insert(TYPE_KEY.into(), Value::String(kind.to_string()));
    if let Some(p) = payload.filter(|v| !v.is_null()) {
        obj.insert(PAYLOAD_KEY.into(), p.clone());
    }
    Value::Object(obj).to_string()
}

/// Parse a wire string into an envelope.
///
/// Extra top-level keys are ignored.
pub fn decode(wire: &str) -> Result<Envelope, DecodeError> {
    let value: Value =
        serde_json::from_str(wire).map_err(|e| DecodeError::InvalidJson(e.to_string()))?;

    let Value::Object(mut obj) = value else {
        return Err(DecodeError::NotAnObject);
    };

    let kind = match obj.remove(TYPE_KEY) {
        Some(Value::String(s)) => s,
        _ => return Err(DecodeError::MissingType),
    };
    if kind.is_empty() {
        return Err(DecodeError::EmptyType);
    }

    Ok(Envelope::new(kind, obj.remove(PAYLOAD_KEY)))
}

//! Demo host logic: reacts to page messages and produces sample sends.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tokio::runtime::Handle;
use webbridge_common::{BridgeError, RequestId};
use webbridge_core::{BridgeSession, Mailbox, MessageListener, REQUEST_ID_KEY};

/// Envelope types the native side cycles through on each trigger.
pub const DEMO_MESSAGE_TYPES: &[&str] = &["appMessage", "notification", "response", "update"];

/// How long the simulated native dialog stays open.
pub const DIALOG_DELAY: Duration = Duration::from_secs(1);

/// Human-readable label for an inbound message type.
pub fn inbound_label(kind: &str) -> String {
    match kind {
        "h5Message" => "page message".to_string(),
        "userInfo" => "user info".to_string(),
        "pageData" => "page data".to_string(),
        "action" => "action request".to_string(),
        "getDeviceInfo" => "device info request".to_string(),
        other => format!("unknown message type: {other}"),
    }
}

/// `requestId` of an `action` payload asking for the native dialog.
pub fn dialog_request(payload: Option<&Value>) -> Option<String> {
    let obj = payload?.as_object()?;
    if obj.get("actionType")?.as_str()? != "openNativeDialog" {
        return None;
    }
    let id = obj.get(REQUEST_ID_KEY)?.as_str()?;
    (!id.is_empty()).then(|| id.to_string())
}

fn request_id_of(payload: Option<&Value>) -> Option<&str> {
    payload?.get(REQUEST_ID_KEY)?.as_str()
}

/// Answer to a page's `getDeviceInfo` query, echoing its `requestId`.
pub fn device_info(request_id: Option<&str>) -> Value {
    let mut info = json!({
        "os": std::env::consts::OS,
        "osFamily": std::env::consts::FAMILY,
        "arch": std::env::consts::ARCH,
        "appVersion": env!("CARGO_PKG_VERSION"),
    });
    if let Some(id) = request_id {
        info[REQUEST_ID_KEY] = Value::String(id.to_string());
    }
    info
}

/// Reply to a completed `openNativeDialog` action.
pub fn action_response(request_id: &str, result: &str, now: DateTime<Utc>) -> Value {
    json!({
        "status": "completed",
        "requestId": request_id,
        "result": result,
        "timestamp": now.timestamp_millis(),
    })
}

/// Type of the `n`th demo send.
pub fn demo_kind(n: usize) -> &'static str {
    DEMO_MESSAGE_TYPES[n % DEMO_MESSAGE_TYPES.len()]
}

/// Sample payload for one of the demo types.
pub fn demo_payload(kind: &str, now: DateTime<Utc>) -> Value {
    let ts = now.timestamp_millis();
    match kind {
        "appMessage" => json!({
            "text": "Plain message from the app",
            "number": ts % 1000,
            "boolean": true,
            "timestamp": ts,
            "nestedObject": {
                "name": "WebBridge",
                "version": env!("CARGO_PKG_VERSION"),
            },
        }),
        "notification" => json!({
            "title": "System notification",
            "content": "An important notice from the app",
            "timestamp": ts,
            "level": "info",
            "actions": {"primary": "View details", "dismiss": "Ignore"},
        }),
        "response" => json!({
            "status": "success",
            "requestId": format!("req_{ts}"),
            "result": {"code": 200, "message": "Operation succeeded", "timestamp": ts},
        }),
        _ => json!({
            "updateType": "system",
            "details": {
                "currentVersion": "1.2.5",
                "newVersion": "1.3.0",
                "releaseNotes": "Bug fixes and performance improvements",
                "mandatory": false,
                "size": "15.2MB",
            },
        }),
    }
}

/// What the page reports back for a `getPageInfo` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageInfo {
    pub title: String,
    pub url: String,
}

impl PageInfo {
    pub fn from_reply(reply: Option<&Value>) -> Option<Self> {
        let reply = reply?;
        Some(Self {
            title: reply.get("title")?.as_str()?.to_string(),
            url: reply.get("url")?.as_str()?.to_string(),
        })
    }
}

/// Ask the page for its title and URL. `on_info` runs once when the page
/// replies with the same `requestId`, with `None` if the reply is
/// malformed.
pub fn request_page_info<F>(session: &BridgeSession, on_info: F) -> Result<RequestId, BridgeError>
where
    F: FnOnce(Option<PageInfo>) + 'static,
{
    session.send_request_with(
        "action",
        Some(json!({"actionType": "getPageInfo"})),
        move |reply| on_info(PageInfo::from_reply(reply.as_ref())),
    )
}

/// Logs inbound traffic, answers device info queries, and answers native
/// dialog requests after a delay.
///
/// The reply is scheduled on the tokio runtime and comes back through the
/// mailbox, so it is sent from the owner thread like everything else.
pub struct DemoListener {
    replies: Mailbox,
    runtime: Handle,
    delay: Duration,
}

impl DemoListener {
    pub fn new(replies: Mailbox, runtime: Handle) -> Self {
        Self {
            replies,
            runtime,
            delay: DIALOG_DELAY,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl MessageListener for DemoListener {
    fn on_message(&self, kind: &str, payload: Option<&Value>) {
        tracing::info!(kind, payload = ?payload, "received {}", inbound_label(kind));

        if kind == "getDeviceInfo" {
            let reply = device_info(request_id_of(payload));
            self.replies.post_send("deviceInfo", Some(reply));
            return;
        }
        if kind != "action" {
            return;
        }
        let Some(request_id) = dialog_request(payload) else {
            return;
        };

        let replies = self.replies.clone();
        let delay = self.delay;
        self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let reply = action_response(&request_id, "OK", Utc::now());
            if !replies.post_send("response", Some(reply)) {
                tracing::debug!(request_id = %request_id, "session gone, dialog reply dropped");
            }
        });
    }
}

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use serde_json::{json, Value};
use webbridge_common::{BridgeError, DecodeError, RequestId};
use webbridge_config::SendPolicy;

use super::*;
use crate::capability::{CapabilityAck, CapabilityReport};
use crate::mailbox::PageLoadState;
use crate::testing::RecordingHost;

type Seen = Rc<RefCell<Vec<(String, Option<Value>)>>>;

fn ack() -> CapabilityAck {
    CapabilityReport::new().grant("network").acknowledge()
}

fn recorder() -> (Seen, Rc<dyn MessageListener>) {
    let seen: Seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let listener: Rc<dyn MessageListener> = Rc::new(move |kind: &str, payload: Option<&Value>| {
        sink.borrow_mut().push((kind.to_string(), payload.cloned()))
    });
    (seen, listener)
}

/// Attached session whose page has finished loading.
fn loaded_session() -> (BridgeSession, Rc<RecordingHost>) {
    let host = Rc::new(RecordingHost::default());
    let session = BridgeSession::new(SessionConfig::default());
    session.attach(host.clone(), &ack()).unwrap();
    session.on_page_load(PageLoadState::Finished);
    (session, host)
}

// -- lifecycle --

#[test]
fn attach_installs_one_entry_point() {
    let (session, host) = loaded_session();
    assert_eq!(session.state(), SessionState::Attached);
    assert_eq!(
        host.installed(),
        vec![("MessageBridge".to_string(), "sendMessageToApp".to_string())]
    );
}

#[test]
fn attach_twice_is_rejected() {
    let (session, host) = loaded_session();
    let err = session.attach(host.clone(), &ack()).unwrap_err();
    assert!(matches!(
        err,
        BridgeError::InvalidTransition {
            from: "attached",
            to: "attached"
        }
    ));
    assert_eq!(host.installed().len(), 1);
}

#[test]
fn detached_session_cannot_reattach() {
    let (session, host) = loaded_session();
    session.detach();
    assert!(matches!(
        session.attach(host, &ack()),
        Err(BridgeError::InvalidTransition {
            from: "detached",
            ..
        })
    ));
}

#[test]
fn detach_is_idempotent_and_removes_entry_point_once() {
    let (session, host) = loaded_session();
    session.detach();
    session.detach();
    assert_eq!(session.state(), SessionState::Detached);
    assert_eq!(host.removed(), vec!["MessageBridge".to_string()]);
}

#[test]
fn detach_without_attach_does_not_fail() {
    let session = BridgeSession::new(SessionConfig::default());
    session.detach();
    session.detach();
    assert_eq!(session.state(), SessionState::Detached);
}

#[test]
fn detach_clears_listeners_and_rejects_new_ones() {
    let (session, _host) = loaded_session();
    let (_seen, listener) = recorder();
    session.add_listener(listener.clone());
    session.detach();
    assert_eq!(session.listener_count(), 0);
    assert!(!session.add_listener(listener));
}

#[test]
fn attach_accepts_denied_but_proceeding_capabilities() {
    let host = Rc::new(RecordingHost::default());
    let session = BridgeSession::new(SessionConfig::default());
    let ack = CapabilityReport::new().deny("camera").acknowledge();
    session.attach(host, &ack).unwrap();
    assert!(session.is_attached());
}

// -- native -> web --

#[test]
fn send_requires_attached_session() {
    let session = BridgeSession::new(SessionConfig::default());
    assert!(matches!(
        session.send("update", None),
        Err(BridgeError::ChannelUnavailable {
            state: "unattached"
        })
    ));
    assert!(matches!(
        session.send_request("action", None),
        Err(BridgeError::ChannelUnavailable { .. })
    ));

    session.detach();
    assert!(matches!(
        session.send("update", None),
        Err(BridgeError::ChannelUnavailable { state: "detached" })
    ));
}

#[test]
fn send_rejects_empty_type() {
    let (session, host) = loaded_session();
    assert!(matches!(
        session.send("", None),
        Err(BridgeError::Decode(DecodeError::EmptyType))
    ));
    assert!(host.scripts().is_empty());
}

#[test]
fn send_reaches_page_callback() {
    let (session, host) = loaded_session();
    let outcome = session
        .send("appMessage", Some(json!({"text": "hello"})))
        .unwrap();
    assert_eq!(outcome, SendOutcome::Delivered);

    let scripts = host.scripts();
    assert_eq!(scripts.len(), 1);
    assert!(scripts[0].starts_with("if (typeof window.onAppMessage === 'function')"));
    let envelopes = host.envelopes();
    assert_eq!(envelopes[0].kind, "appMessage");
    assert_eq!(envelopes[0].payload, Some(json!({"text": "hello"})));
}

#[test]
fn sends_before_load_are_flushed_on_finish() {
    let host = Rc::new(RecordingHost::default());
    let session = BridgeSession::new(SessionConfig::default());
    session.attach(host.clone(), &ack()).unwrap();

    assert_eq!(session.send("first", None).unwrap(), SendOutcome::Queued);
    assert_eq!(session.send("second", None).unwrap(), SendOutcome::Queued);
    assert!(host.scripts().is_empty());

    session.on_page_load(PageLoadState::Finished);
    let kinds: Vec<String> = host.envelopes().into_iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec!["first", "second"]);
}

#[test]
fn drop_policy_abandons_requests_sent_before_load() {
    let host = Rc::new(RecordingHost::default());
    let session = BridgeSession::new(SessionConfig {
        send_before_load: SendPolicy::Drop,
        ..SessionConfig::default()
    });
    session.attach(host.clone(), &ack()).unwrap();

    let id = session.send_request("action", None).unwrap();
    assert_eq!(session.request_status(&id), None);
    assert_eq!(session.pending_count(), 0);
    assert!(host.scripts().is_empty());
}

// -- web -> native --

#[test]
fn inbound_fans_out_to_every_listener_once() {
    let (session, _host) = loaded_session();
    let recorders: Vec<_> = (0..4).map(|_| recorder()).collect();
    for (_, l) in &recorders {
        assert!(session.add_listener(l.clone()));
    }

    let routed = session.receive(r#"{"type":"userInfo","data":{"name":"li","age":20}}"#);
    assert_eq!(routed, Routed::Unsolicited);
    for (seen, _) in &recorders {
        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "userInfo");
        assert_eq!(seen[0].1, Some(json!({"name": "li", "age": 20})));
    }
}

#[test]
fn duplicate_listener_receives_once() {
    let (session, _host) = loaded_session();
    let (seen, listener) = recorder();
    assert!(session.add_listener(listener.clone()));
    assert!(!session.add_listener(listener));
    session.receive(r#"{"type":"h5Message"}"#);
    assert_eq!(seen.borrow().len(), 1);
}

#[test]
fn remove_listener_twice_is_noop() {
    let (session, _host) = loaded_session();
    let (seen, listener) = recorder();
    assert!(!session.remove_listener(&listener));
    session.add_listener(listener.clone());
    assert!(session.remove_listener(&listener));
    assert!(!session.remove_listener(&listener));
    session.receive(r#"{"type":"pageData"}"#);
    assert!(seen.borrow().is_empty());
}

#[test]
fn removal_during_dispatch_keeps_current_snapshot() {
    let (session, _host) = loaded_session();
    let (seen, victim) = recorder();

    let remover: Rc<dyn MessageListener> = {
        let session = session.clone();
        let victim = victim.clone();
        Rc::new(move |_: &str, _: Option<&Value>| {
            session.remove_listener(&victim);
        })
    };
    session.add_listener(remover);
    session.add_listener(victim);

    session.receive(r#"{"type":"h5Message"}"#);
    assert_eq!(seen.borrow().len(), 1);
    session.receive(r#"{"type":"h5Message"}"#);
    assert_eq!(seen.borrow().len(), 1);
    assert_eq!(session.listener_count(), 1);
}

#[test]
fn malformed_input_reaches_no_listener() {
    let (session, _host) = loaded_session();
    let (seen, listener) = recorder();
    session.add_listener(listener);

    for body in ["not json", "", "[]", r#"{"data":1}"#, r#"{"type":""}"#] {
        assert_eq!(session.receive(body), Routed::Rejected);
    }
    assert!(seen.borrow().is_empty());
}

#[test]
fn inbound_before_attach_is_ignored() {
    let session = BridgeSession::new(SessionConfig::default());
    let (seen, listener) = recorder();
    session.add_listener(listener);
    assert_eq!(session.receive(r#"{"type":"h5Message"}"#), Routed::Ignored);
    assert!(seen.borrow().is_empty());
}

#[test]
fn listener_may_send_during_dispatch() {
    let (session, host) = loaded_session();
    let echo: Rc<dyn MessageListener> = {
        let session = session.clone();
        Rc::new(move |kind: &str, _: Option<&Value>| {
            session
                .send("response", Some(json!({"echo": kind})))
                .unwrap();
        })
    };
    session.add_listener(echo);
    session.receive(r#"{"type":"h5Message"}"#);
    assert_eq!(host.envelopes()[0].payload, Some(json!({"echo": "h5Message"})));
}

// -- correlation --

#[test]
fn thousand_requests_get_distinct_ids() {
    let (session, _host) = loaded_session();
    let ids: HashSet<RequestId> = (0..1000)
        .map(|_| session.send_request("action", None).unwrap())
        .collect();
    assert_eq!(ids.len(), 1000);
    assert_eq!(session.pending_count(), 1000);
}

#[test]
fn request_id_travels_in_payload() {
    let (session, host) = loaded_session();
    let id = session
        .send_request("action", Some(json!({"actionType": "openNativeDialog"})))
        .unwrap();
    let sent = &host.envelopes()[0];
    assert_eq!(sent.kind, "action");
    assert_eq!(sent.request_id(), Some(id.as_str()));
    assert_eq!(session.request_status(&id), Some(RequestStatus::Pending));
    assert_eq!(session.pending_request(&id).unwrap().kind, "action");
}

#[test]
fn reply_resolves_matching_continuation_once() {
    let (session, _host) = loaded_session();
    let (seen, listener) = recorder();
    session.add_listener(listener);

    let reply = Rc::new(RefCell::new(None));
    let sink = reply.clone();
    let id = session
        .send_request_with("action", Some(json!({"requestId": "req_42"})), move |p| {
            *sink.borrow_mut() = Some(p)
        })
        .unwrap();
    assert_eq!(id.as_str(), "req_42");

    let body = r#"{"type":"response","data":{"requestId":"req_42","result":"ok"}}"#;
    assert_eq!(session.receive(body), Routed::Completed(id.clone()));
    assert_eq!(*reply.borrow(), Some(Some(json!({"result": "ok"}))));
    assert_eq!(session.request_status(&id), None);
    assert!(seen.borrow().is_empty());

    assert_eq!(session.receive(body), Routed::Unsolicited);
    assert_eq!(seen.borrow().len(), 1);
    assert_eq!(seen.borrow()[0].0, "response");
}

#[test]
fn reply_without_continuation_goes_to_listeners() {
    let (session, _host) = loaded_session();
    let (seen, listener) = recorder();
    session.add_listener(listener);

    let id = session.send_request("action", None).unwrap();
    let body = json!({"type": "response", "data": {"requestId": id.as_str(), "status": "completed"}});
    assert_eq!(session.receive(&body.to_string()), Routed::Completed(id));
    assert_eq!(seen.borrow()[0].1.as_ref().unwrap()["status"], "completed");
}

#[test]
fn unknown_request_id_is_unsolicited() {
    let (session, _host) = loaded_session();
    let (seen, listener) = recorder();
    session.add_listener(listener);
    session.send_request("action", None).unwrap();

    let routed = session.receive(r#"{"type":"response","data":{"requestId":"req_999"}}"#);
    assert_eq!(routed, Routed::Unsolicited);
    assert_eq!(seen.borrow().len(), 1);
    assert_eq!(session.pending_count(), 1);
}

#[test]
fn duplicate_caller_id_is_not_sent() {
    let (session, host) = loaded_session();
    session
        .send_request("action", Some(json!({"requestId": "fixed"})))
        .unwrap();
    assert!(matches!(
        session.send_request("action", Some(json!({"requestId": "fixed"}))),
        Err(BridgeError::DuplicateRequestId(_))
    ));
    assert_eq!(host.scripts().len(), 1);
}

#[test]
fn request_payload_that_cannot_carry_an_id_is_rejected() {
    let (session, host) = loaded_session();
    assert!(matches!(
        session.send_request("action", Some(json!(["openNativeDialog"]))),
        Err(BridgeError::InvalidRequest(_))
    ));
    assert!(matches!(
        session.send_request("action", Some(json!({"requestId": 7}))),
        Err(BridgeError::InvalidRequest(_))
    ));
    assert_eq!(session.pending_count(), 0);
    assert!(host.scripts().is_empty());
}

#[test]
fn abandoned_request_reply_is_unsolicited() {
    let (session, _host) = loaded_session();
    let called = Rc::new(RefCell::new(false));
    let flag = called.clone();
    let id = session
        .send_request_with("action", None, move |_| *flag.borrow_mut() = true)
        .unwrap();

    assert!(session.abandon(&id));
    assert!(!session.abandon(&id));
    let body = json!({"type": "response", "data": {"requestId": id.as_str()}});
    assert_eq!(session.receive(&body.to_string()), Routed::Unsolicited);
    assert!(!*called.borrow());
}

#[test]
fn failed_request_send_is_abandoned() {
    let (session, host) = loaded_session();
    host.fail_scripts(true);
    assert!(matches!(
        session.send_request("action", None),
        Err(BridgeError::Script(_))
    ));
    assert_eq!(session.pending_count(), 0);
}

#[test]
fn detach_abandons_pending_and_ignores_late_reply() {
    let (session, _host) = loaded_session();
    let called = Rc::new(RefCell::new(false));
    let flag = called.clone();
    let id = session
        .send_request_with("action", None, move |_| *flag.borrow_mut() = true)
        .unwrap();

    session.detach();
    assert_eq!(session.request_status(&id), Some(RequestStatus::Abandoned));

    let body = json!({"type": "response", "data": {"requestId": id.as_str()}});
    assert_eq!(session.receive(&body.to_string()), Routed::Ignored);
    assert!(!*called.borrow());
}

#[test]
fn continuation_may_call_back_into_session() {
    let (session, host) = loaded_session();
    let inner = session.clone();
    let id = session
        .send_request_with("action", None, move |reply| {
            inner.send("update", reply).unwrap();
        })
        .unwrap();

    let body = json!({"type": "response", "data": {"requestId": id.as_str(), "n": 1}});
    session.receive(&body.to_string());
    let envelopes = host.envelopes();
    assert_eq!(envelopes.last().unwrap().kind, "update");
    assert_eq!(envelopes.last().unwrap().payload, Some(json!({"n": 1})));
}

// -- external results --

#[test]
fn external_results_route_by_flow_code() {
    let (session, _host) = loaded_session();
    let codes = Rc::new(RefCell::new(Vec::new()));
    let sink = codes.clone();
    session.register_result_handler(1001, move |r| sink.borrow_mut().push(r.result_code));

    assert!(session.forward_result(1001, 0, Some(json!({"granted": ["camera"]}))));
    assert!(!session.forward_result(2002, 0, None));
    assert_eq!(*codes.borrow(), vec![0]);

    assert!(session.unregister_result_handler(1001));
    assert!(!session.forward_result(1001, 0, None));
}

#[test]
fn external_results_after_detach_are_dropped() {
    let (session, _host) = loaded_session();
    session.register_result_handler(1001, |_| panic!("must not run"));
    session.detach();
    assert!(!session.forward_result(1001, 0, None));
    assert!(!session.register_result_handler(1001, |_| {}));
}

// -- mailbox --

#[test]
fn pump_applies_events_posted_from_other_threads() {
    let (session, host) = loaded_session();
    let (seen, listener) = recorder();
    session.add_listener(listener);

    let mailbox = session.mailbox();
    std::thread::spawn(move || {
        mailbox.post_inbound(r#"{"type":"pageData","data":{"page":1}}"#);
        mailbox.post_send("notification", Some(json!({"level": "info"})));
    })
    .join()
    .unwrap();

    assert_eq!(seen.borrow().len(), 0);
    assert_eq!(session.pump(), 2);
    assert_eq!(seen.borrow()[0].0, "pageData");
    assert_eq!(host.envelopes()[0].kind, "notification");
    assert_eq!(session.pump(), 0);
}

#[test]
fn pump_tracks_page_loads() {
    let host = Rc::new(RecordingHost::default());
    let session = BridgeSession::new(SessionConfig::default());
    session.attach(host.clone(), &ack()).unwrap();
    let mailbox = session.mailbox();

    session.send("queued", None).unwrap();
    mailbox.post_page_load(PageLoadState::Finished);
    session.pump();
    assert_eq!(host.envelopes().len(), 1);

    mailbox.post_page_load(PageLoadState::Started);
    session.pump();
    assert_eq!(session.send("later", None).unwrap(), SendOutcome::Queued);
}

#[test]
fn surface_closed_detaches_and_closes_mailbox() {
    let (session, _host) = loaded_session();
    let mailbox = session.mailbox();
    mailbox.post(crate::mailbox::BridgeEvent::SurfaceClosed);
    mailbox.post_inbound(r#"{"type":"h5Message"}"#);
    assert_eq!(session.pump(), 2);
    assert_eq!(session.state(), SessionState::Detached);
    assert!(!mailbox.post_inbound(r#"{"type":"h5Message"}"#));
}

#[test]
fn marshaled_external_result_is_routed() {
    let (session, _host) = loaded_session();
    let hits = Rc::new(RefCell::new(0));
    let sink = hits.clone();
    session.register_result_handler(7, move |_| *sink.borrow_mut() += 1);
    session.mailbox().post_result(7, -1, None);
    session.pump();
    assert_eq!(*hits.borrow(), 1);
}

//! End-to-end tests over the in-process channel bridge.
//!
//! Each test starts a real session with its dispatcher thread and drives it
//! through the host side of the bridge.

use collabedit::protocol::{value_from_json, INDEX_KEY, LINE_KEY, TEXT_KEY, TYPE_KEY};
use collabedit::{
    BridgeHandle, Capabilities, Capability, ChannelBridge, CollabConfig, CollabError, CollabSession,
    DocumentRef, EditOperation, EventClass, HostEvent, Outbound, ShutdownPolicy, WireMessage,
    WireValue,
};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn start_session() -> (CollabSession, BridgeHandle) {
    start_session_with(CollabConfig::default())
}

fn start_session_with(config: CollabConfig) -> (CollabSession, BridgeHandle) {
    let (bridge, handle) = ChannelBridge::new();
    let session = CollabSession::start(Arc::new(bridge), DocumentRef::new(), config).unwrap();
    (session, handle)
}

#[test]
fn test_inbound_edit_reaches_queue() {
    let (session, handle) = start_session();
    let msg = WireMessage::new()
        .with(TYPE_KEY, "insert_text")
        .with(LINE_KEY, 2)
        .with(INDEX_KEY, 5)
        .with(TEXT_KEY, "x");
    handle.deliver(msg).unwrap();

    let op = session.queue().pop_blocking();
    assert_eq!(op, EditOperation::insert_text(session.document(), 2, 5, "x").unwrap());
}

#[test]
fn test_local_edit_published() {
    let (session, mut handle) = start_session();
    let op = EditOperation::append_line(session.document(), 4, "hello").unwrap();
    session.publisher().publish(&op).unwrap();

    let expected = WireMessage::new()
        .with(TYPE_KEY, "append_line")
        .with(LINE_KEY, 4)
        .with(TEXT_KEY, "hello");
    assert_eq!(handle.blocking_recv(), Some(Outbound::Message(expected)));
}

#[test]
fn test_edit_relayed_between_two_sessions() {
    let (alice, mut alice_host) = start_session();
    let (bob, bob_host) = start_session();

    let local = [
        EditOperation::append_line(alice.document(), 4, "hello").unwrap(),
        EditOperation::insert_text(alice.document(), 2, 5, "x").unwrap(),
        EditOperation::remove_line(alice.document(), 7).unwrap(),
        EditOperation::delete_text(alice.document(), 1, 0, 3).unwrap(),
        EditOperation::replace_line(alice.document(), 9, "new").unwrap(),
    ];
    for op in &local {
        alice.publisher().publish(op).unwrap();
    }

    // Play the remote service: forward everything Alice sends to Bob.
    for _ in 0..local.len() {
        match alice_host.blocking_recv() {
            Some(Outbound::Message(msg)) => bob_host.deliver(msg).unwrap(),
            other => panic!("Expected an edit message, got {other:?}"),
        }
    }

    let queue = bob.queue();
    for op in &local {
        let received = queue.pop_blocking();
        assert_eq!(received.edit, op.edit);
        assert_eq!(received.document, bob.document());
    }
    assert_eq!(alice.publisher().published(), 5);
}

#[test]
fn test_malformed_messages_skipped_without_stopping() {
    let (session, mut handle) = start_session();

    handle.deliver(WireValue::Str("hello console".into())).unwrap();
    handle.deliver(WireMessage::new().with(LINE_KEY, 1)).unwrap();
    handle.deliver(WireMessage::new().with(TYPE_KEY, "frobnicate")).unwrap();
    handle
        .deliver(
            WireMessage::new()
                .with(TYPE_KEY, "insert_text")
                .with(LINE_KEY, 2)
                .with(TEXT_KEY, "x"),
        )
        .unwrap();
    handle
        .deliver(
            WireMessage::new()
                .with(TYPE_KEY, "delete_text")
                .with(LINE_KEY, 1)
                .with(INDEX_KEY, -1)
                .with("length", 3),
        )
        .unwrap();
    handle
        .deliver(WireMessage::new().with(TYPE_KEY, "remove_line").with(LINE_KEY, 3))
        .unwrap();

    let op = session.queue().pop_blocking();
    assert_eq!(op, EditOperation::remove_line(session.document(), 3).unwrap());
    assert!(session.queue().is_empty());

    // Three diagnostics: unknown kind, missing field, invalid field.
    let mut notices = Vec::new();
    for _ in 0..3 {
        match handle.blocking_recv() {
            Some(Outbound::Text(text)) => notices.push(text),
            other => panic!("Expected a diagnostic, got {other:?}"),
        }
    }
    assert!(notices.iter().all(|n| n.starts_with("info: msgloop ")));
    assert!(notices[0].contains("frobnicate"));
    assert!(notices[1].contains("'index'"));
    assert!(notices[2].contains("-1"));

    let stats = session.stats();
    assert_eq!(stats.received, 6);
    assert_eq!(stats.enqueued, 1);
    assert_eq!(stats.ignored, 2);
    assert_eq!(stats.rejected, 3);
}

#[test]
fn test_other_event_classes_not_processed() {
    let (session, handle) = start_session();
    handle
        .deliver_event(HostEvent {
            class: EventClass::HandleInputEvent,
            payload: WireMessage::new().with(TYPE_KEY, "remove_line").with(LINE_KEY, 1).into(),
        })
        .unwrap();
    handle
        .deliver(WireMessage::new().with(TYPE_KEY, "remove_line").with(LINE_KEY, 2))
        .unwrap();

    let op = session.queue().pop_blocking();
    assert_eq!(op.edit.line().get(), 2);
    assert_eq!(session.stats().received, 1);
}

#[test]
fn test_ordering_under_concurrent_delivery() {
    const N: i32 = 2_000;
    let (session, handle) = start_session_with(CollabConfig {
        echo_diagnostics: false,
        ..CollabConfig::default()
    });

    let producer = thread::spawn(move || {
        for i in 0..N {
            handle
                .deliver(WireMessage::new().with(TYPE_KEY, "remove_line").with(LINE_KEY, i))
                .unwrap();
            if i % 7 == 0 {
                handle.deliver(WireValue::Null).unwrap();
            }
        }
        handle
    });

    let queue = session.queue();
    let mut seen = Vec::with_capacity(N as usize);
    for _ in 0..N {
        seen.push(queue.pop_blocking().edit.line().to_i32());
    }
    let _handle = producer.join().unwrap();

    let expected: Vec<i32> = (0..N).collect();
    assert_eq!(seen, expected);
    assert!(queue.try_pop().is_none());
}

#[test]
fn test_json_lines_decode() {
    let (session, handle) = start_session();
    let lines = [
        r#"{"collabedit_type":"replace_line","line":9,"text":"new"}"#,
        r#""not an edit""#,
        r#"{"collabedit_type":"remove_line","line":4294967296}"#,
        r#"{"collabedit_type":"append_line","line":0,"text":"héllo ✓"}"#,
    ];
    for line in lines {
        handle.deliver(value_from_json(line).unwrap()).unwrap();
    }

    let queue = session.queue();
    assert_eq!(
        queue.pop_blocking(),
        EditOperation::replace_line(session.document(), 9, "new").unwrap()
    );
    assert_eq!(
        queue.pop_blocking(),
        EditOperation::append_line(session.document(), 0, "héllo ✓").unwrap()
    );
}

#[test]
fn test_missing_capabilities_refuse_start() {
    let (bridge, _handle) = ChannelBridge::with_capabilities(Capabilities {
        messaging: false,
        ..Capabilities::ALL
    });
    let result = CollabSession::start(Arc::new(bridge), DocumentRef::new(), CollabConfig::default());
    match result {
        Err(err @ CollabError::BridgeUnavailable(_)) => {
            assert_eq!(err, CollabError::BridgeUnavailable(vec![Capability::Messaging]));
            assert_eq!(err.exit_code(), 2);
        }
        Err(other) => panic!("Expected BridgeUnavailable, got {other}"),
        Ok(_) => panic!("Session should not start without messaging"),
    }
}

#[test]
fn test_publish_after_host_gone_fails() {
    let (session, handle) = start_session();
    drop(handle);

    let op = EditOperation::remove_line(session.document(), 0).unwrap();
    let err = session.publisher().publish(&op).unwrap_err();
    assert!(matches!(err, CollabError::SendFailure(_)));
}

#[test]
fn test_shutdown_joins_after_bridge_close() {
    let (session, handle) = start_session_with(CollabConfig {
        shutdown_policy: ShutdownPolicy::Join,
        ..CollabConfig::default()
    });
    handle
        .deliver(WireMessage::new().with(TYPE_KEY, "remove_line").with(LINE_KEY, 1))
        .unwrap();
    for _ in 0..400 {
        if session.stats().enqueued == 1 {
            break;
        }
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(session.stats().enqueued, 1);
    drop(handle);

    for _ in 0..400 {
        if session.supervisor().is_finished() {
            break;
        }
        thread::sleep(Duration::from_millis(5));
    }
    assert!(session.supervisor().is_finished());

    let queue = session.queue();
    session.shutdown().unwrap();
    assert_eq!(queue.len(), 1);
}

#[test]
fn test_bridge_close_ends_dispatcher() {
    let (session, handle) = start_session();
    assert!(!session.supervisor().is_finished());
    drop(handle);

    // Closing the bridge ends the loop.
    for _ in 0..200 {
        if session.supervisor().is_finished() {
            break;
        }
        thread::sleep(Duration::from_millis(5));
    }
    assert!(session.supervisor().is_finished());
}

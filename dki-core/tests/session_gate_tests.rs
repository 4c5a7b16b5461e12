// SPDX-FileCopyrightText: 2026 Don't Kill It! Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for session
//! Connection lifetime follows authentication lifetime.

mod common;

use common::Received;
use dki_core::network::*;
use dki_core::session::ManagerFactory;
use dki_core::{SessionGate, SessionProvider, SessionState, SessionStore};

type MockGate = SessionGate<MockTransport, MockScheduler, SessionStore>;

struct Fixture {
    gate: MockGate,
    session: SessionStore,
    transport: MockTransport,
    scheduler: MockScheduler,
    received: Received,
}

fn fixture() -> Fixture {
    let session = SessionStore::new();
    let transport = MockTransport::new();
    let scheduler = MockScheduler::new();
    let received = Received::default();

    let factory: ManagerFactory<MockTransport, MockScheduler> = {
        let transport = transport.clone();
        let scheduler = scheduler.clone();
        let handler = received.handler();
        Box::new(move || {
            ConnectionManager::new(
                transport.clone(),
                scheduler.clone(),
                TransportConfig::default(),
                handler.clone(),
            )
        })
    };

    Fixture {
        gate: SessionGate::new(session.clone(), factory),
        session,
        transport,
        scheduler,
        received,
    }
}

fn open_current(f: &mut Fixture) -> ConnectionId {
    let id = f.transport.last_opened().unwrap();
    f.gate
        .handle_event(TransportEvent::new(id, TransportEventKind::Opened));
    id
}

#[test]
fn test_initial_state_signed_out() {
    let f = fixture();
    assert_eq!(f.gate.state(), SessionState::SignedOut);
    assert_eq!(f.gate.connection_state(), ConnectionState::Idle);
    assert!(f.gate.manager().is_none());
}

#[test]
fn test_sign_in_connects_with_provider_token() {
    let mut f = fixture();
    f.session.sign_in("jwt-token");
    f.gate.refresh();

    assert_eq!(f.gate.state(), SessionState::SignedIn);
    assert_eq!(f.gate.connection_state(), ConnectionState::Connecting);
    let endpoint = &f.transport.endpoints()[0];
    assert_eq!(
        endpoint.query_pairs().find(|(k, _)| k == "token").unwrap().1,
        "jwt-token"
    );
}

#[test]
fn test_refresh_without_change_is_noop() {
    let mut f = fixture();
    f.gate.refresh();
    assert!(f.transport.opened().is_empty());

    f.session.sign_in("tok");
    f.gate.refresh();
    f.gate.refresh();
    assert_eq!(f.transport.opened().len(), 1);
}

#[test]
fn test_sign_out_tears_down_synchronously() {
    let mut f = fixture();
    f.session.sign_in("tok");
    f.gate.refresh();
    let id = open_current(&mut f);
    let (heartbeat, _) = f.scheduler.pending()[0];

    f.session.sign_out();
    f.gate.refresh();

    assert_eq!(f.gate.state(), SessionState::SignedOut);
    assert_eq!(f.gate.connection_state(), ConnectionState::Closed);
    assert!(f.scheduler.is_cancelled(heartbeat));
    assert!(f.scheduler.pending().is_empty());
    assert_eq!(f.transport.closed(), vec![id]);

    // A heartbeat expiration delivered late does nothing.
    f.gate.handle_timer(heartbeat);
    assert!(f.transport.sent_frames().is_empty());
}

#[test]
fn test_events_after_sign_out_are_dropped() {
    let mut f = fixture();
    f.gate.set_authenticated(false);
    f.session.sign_in("tok");
    f.gate.refresh();
    let id = open_current(&mut f);

    f.gate.set_authenticated(false);
    f.gate.handle_event(TransportEvent::new(
        id,
        TransportEventKind::Frame(r#"{"type":"notification","data":{"id":1,"title":"x"}}"#.into()),
    ));
    f.gate
        .handle_event(TransportEvent::new(id, TransportEventKind::Closed));

    assert_eq!(f.received.count(), 0);
    assert!(f.scheduler.pending().is_empty());
}

#[test]
fn test_exhaustion_recovers_after_new_sign_in() {
    let mut f = fixture();
    f.session.sign_in("tok");
    f.gate.refresh();

    // Initial attempt plus five retries, all failing.
    for _ in 0..6 {
        let id = f.transport.last_opened().unwrap();
        f.gate
            .handle_event(TransportEvent::new(id, TransportEventKind::Closed));
        if let Some((timer, _)) = f.scheduler.pending().first().copied() {
            f.scheduler.fire(timer);
            f.gate.handle_timer(timer);
        }
    }
    assert_eq!(f.transport.opened().len(), 6);
    assert!(f.scheduler.pending().is_empty());
    assert_eq!(f.gate.manager().unwrap().reconnect_attempt(), 5);

    f.session.sign_out();
    f.gate.refresh();
    f.session.sign_in("tok");
    f.gate.refresh();

    assert_eq!(f.transport.opened().len(), 7);
    assert_eq!(f.gate.manager().unwrap().reconnect_attempt(), 0);

    let id = f.transport.last_opened().unwrap();
    f.gate
        .handle_event(TransportEvent::new(id, TransportEventKind::Closed));
    assert_eq!(
        f.scheduler.pending()[0].1,
        std::time::Duration::from_millis(1000)
    );
}

#[test]
fn test_teardown_while_signed_in() {
    let mut f = fixture();
    f.session.sign_in("tok");
    f.gate.refresh();
    let id = open_current(&mut f);

    f.gate.teardown();
    f.gate.teardown();

    assert_eq!(f.gate.state(), SessionState::SignedOut);
    assert_eq!(f.transport.closed(), vec![id]);
    assert!(f.scheduler.pending().is_empty());
}

#[test]
fn test_blank_token_is_not_authenticated() {
    let session = SessionStore::new();
    assert!(!session.is_authenticated());

    session.sign_in("  ");
    assert!(!session.is_authenticated());

    session.sign_in("tok");
    assert!(session.is_authenticated());
    assert_eq!(session.token().as_deref(), Some("tok"));

    session.sign_out();
    assert!(session.token().is_none());
}

#[test]
fn test_notifications_flow_through_gate() {
    let mut f = fixture();
    f.session.sign_in("tok");
    f.gate.refresh();
    let id = open_current(&mut f);

    f.gate.handle_event(TransportEvent::new(
        id,
        TransportEventKind::Frame(
            r#"{"type":"notification","data":{"id":1,"title":"Water me"}}"#.into(),
        ),
    ));

    let received = f.received.all();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].id(), 1);
    assert_eq!(received[0].title(), "Water me");
}

//! Fuzz target for the [`Client`] state machine
//!
//! Prevent plaintext leaks and lost messages via invalid state
//! transitions
//!
//! # Strategy
//!
//! - Event sequences: Arbitrary interleavings of transport lifecycle
//!   events, application intents, and inbound payloads
//! - Hostile envelopes: IVs and ciphertext that are not valid base64,
//!   wrong-width IVs, unknown group ids
//! - Connection probing: sends and joins in every connection state
//!
//! # Invariants
//!
//! - NEVER panic on any event sequence
//! - `Emit` actions only occur while `Connected`
//! - Every inbound `new_message` produces exactly one `Publish`; no
//!   other event publishes
//! - The group-key cache never shrinks within a session

#![no_main]

use std::{
    future::Future,
    pin::Pin,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    task::{Context, Poll},
    time::{Duration, Instant},
};

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use veil_client::{Client, ClientAction, ClientEvent, ConnectionState, Environment};
use veil_proto::{EncryptedEnvelope, GroupNotice, InboundMessage, ServerPayload};

struct ImmediateFuture;

impl Future for ImmediateFuture {
    type Output = ();

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        Poll::Ready(())
    }
}

#[derive(Clone, Default)]
struct FuzzEnv {
    counter: Arc<AtomicU64>,
}

impl Environment for FuzzEnv {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, _duration: Duration) -> impl Future<Output = ()> + Send {
        ImmediateFuture
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        for byte in buffer.iter_mut() {
            *byte = (self.counter.fetch_add(1, Ordering::Relaxed) % 249) as u8;
        }
    }
}

#[derive(Debug, Clone, Arbitrary)]
enum FuzzEvent {
    ConnectRequested,
    TransportConnected,
    TransportDisconnected,
    Join { group: u8 },
    Leave { group: u8 },
    Send { group: u8, text: String },
    ActiveGroupChanged,
    InboundPlain { group: u8, text: String },
    InboundEnvelope { group: u8, ciphertext: String, iv: Option<String> },
    InboundNotice { group: u8, joined: bool },
}

fn to_event(event: FuzzEvent, next_id: &mut u64) -> ClientEvent {
    let user = "fuzzer".to_string();
    match event {
        FuzzEvent::ConnectRequested => ClientEvent::ConnectRequested,
        FuzzEvent::TransportConnected => ClientEvent::TransportConnected,
        FuzzEvent::TransportDisconnected => ClientEvent::TransportDisconnected,
        FuzzEvent::Join { group } => {
            ClientEvent::JoinGroup { group_id: format!("g{group}"), username: user }
        }
        FuzzEvent::Leave { group } => {
            ClientEvent::LeaveGroup { group_id: format!("g{group}"), username: user }
        }
        FuzzEvent::Send { group, text } => {
            ClientEvent::SendMessage { group_id: format!("g{group}"), text, username: user }
        }
        FuzzEvent::ActiveGroupChanged => ClientEvent::ActiveGroupChanged,
        FuzzEvent::InboundPlain { group, text } => {
            *next_id += 1;
            ClientEvent::Inbound(ServerPayload::NewMessage(InboundMessage {
                id: next_id.to_string(),
                group_id: format!("g{group}"),
                sender: user,
                text,
                timestamp: "00:00:00".to_string(),
                encrypted: None,
            }))
        }
        FuzzEvent::InboundEnvelope { group, ciphertext, iv } => {
            *next_id += 1;
            let group_id = format!("g{group}");
            ClientEvent::Inbound(ServerPayload::NewMessage(InboundMessage {
                id: next_id.to_string(),
                group_id: group_id.clone(),
                sender: user,
                text: ciphertext.clone(),
                timestamp: "00:00:00".to_string(),
                encrypted: Some(EncryptedEnvelope { ciphertext, iv, group_id }),
            }))
        }
        FuzzEvent::InboundNotice { group, joined } => {
            let notice = GroupNotice { group_id: format!("g{group}"), username: user };
            ClientEvent::Inbound(if joined {
                ServerPayload::UserJoined(notice)
            } else {
                ServerPayload::UserLeft(notice)
            })
        }
    }
}

fuzz_target!(|events: Vec<FuzzEvent>| {
    let mut client = Client::new(FuzzEnv::default());
    let mut next_id = 0u64;

    for event in events {
        let is_inbound_message =
            matches!(event, FuzzEvent::InboundPlain { .. } | FuzzEvent::InboundEnvelope { .. });
        let connected_before = client.state() == ConnectionState::Connected;
        let keys_before = client.group_key_count();

        let actions = client.handle(to_event(event, &mut next_id));

        let mut publishes = 0usize;
        for action in &actions {
            match action {
                ClientAction::Emit(_) => {
                    assert!(connected_before, "emitted a payload while not connected");
                }
                ClientAction::Publish(_) => publishes += 1,
                _ => {}
            }
        }

        if is_inbound_message {
            assert_eq!(publishes, 1, "inbound message must publish exactly once");
        } else {
            assert_eq!(publishes, 0, "only inbound messages publish");
        }

        assert!(
            client.group_key_count() >= keys_before,
            "group keys are cached for the session, never evicted"
        );

        assert!(matches!(
            client.state(),
            ConnectionState::Disconnected | ConnectionState::Connecting | ConnectionState::Connected
        ));
    }
});

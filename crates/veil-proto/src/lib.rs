//! Veil wire payloads
//!
//! Logical payload types exchanged with the realtime transport
//! collaborator, plus the group-directory records. The transport library
//! owns framing, delivery, and reconnection; this crate only describes
//! the shapes that cross its boundary.
//!
//! # Wire format
//!
//! Payloads serialize to JSON. Client-to-server payloads are tagged with
//! their logical event name (`join_group`, `leave_group`,
//! `send_message`); server-to-client payloads with `new_message`,
//! `user_joined`, `user_left`. Field names follow the wire's camelCase
//! convention.
//!
//! # Invariants
//!
//! - A `send_message` payload carries exactly one of `message` /
//!   `encrypted`, enforced structurally by [`MessageBody`].
//! - An [`EncryptedEnvelope`] without an IV is the degrade-to-plaintext
//!   sentinel, not malformed data.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod directory;
mod envelope;
mod events;

pub use directory::Group;
pub use envelope::EncryptedEnvelope;
pub use events::{ClientPayload, GroupNotice, InboundMessage, MessageBody, ServerPayload};

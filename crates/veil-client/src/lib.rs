//! Veil Client
//!
//! Action-based client state machine for the Veil messaging protocol.
//! Manages the connection lifecycle, group membership intents, and
//! message encryption/decryption.
//!
//! # Architecture
//!
//! The client is a pure state machine that:
//! - Receives events from the caller (transport events, application
//!   intents)
//! - Produces actions for the caller to execute (emit payloads, publish
//!   messages, update subscribers)
//! - Uses the `Environment` trait for randomness (deterministic
//!   testing)
//!
//! # Components
//!
//! - [`Client`]: the transport-facing state machine
//! - [`codec`]: plaintext <-> envelope conversion with the
//!   degrade-to-plaintext policy
//! - [`ClientEvent`]: events fed into the client
//! - [`ClientAction`]: actions produced by the client

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod client;
pub mod codec;
mod error;
mod event;

pub use client::Client;
pub use error::ClientError;
pub use event::{ClientAction, ClientEvent, LogLevel};
pub use veil_core::{ConnectionState, EnvRng, Environment, Message};

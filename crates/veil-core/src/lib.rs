//! Veil core domain model.
//!
//! Shared foundations for the client state machine and the session
//! driver:
//!
//! - [`env::Environment`]: time and randomness abstraction enabling
//!   deterministic simulation
//! - [`Message`] / [`ConnectionState`]: the decoded domain model the
//!   presentation layer consumes
//! - [`MessageStore`]: the per-session append log of decoded messages
//! - [`transport::Transport`]: the boundary trait for the external
//!   realtime connection collaborator

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod env;
mod message;
mod store;
pub mod transport;

pub use env::{EnvRng, Environment};
pub use message::{ConnectionState, Message};
pub use store::MessageStore;
pub use transport::{Transport, TransportError, TransportEvent};

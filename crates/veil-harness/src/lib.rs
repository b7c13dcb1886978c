//! Deterministic simulation harness for Veil client testing.
//!
//! In-memory implementations of the Environment and Transport traits
//! for reproducible testing without sockets:
//!
//! - [`SimEnv`]: seeded RNG environment (same seed, same byte stream)
//! - [`SimServer`]: relay with the production server's semantics:
//!   per-group membership, full-room message broadcast including the
//!   sender, join/leave notices, server-assigned ids and timestamps
//! - [`LoopbackTransport`]: channel-backed Transport wired to a
//!   `SimServer`; the emit leg round-trips payloads through their JSON
//!   wire form so the harness also exercises the wire format

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod loopback;
mod sim_env;
mod sim_server;

pub use loopback::LoopbackTransport;
pub use sim_env::SimEnv;
pub use sim_server::SimServer;

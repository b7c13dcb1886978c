//! Events fed to the client and actions it produces.
//!
//! The client never performs I/O. The driver translates transport
//! events and application intents into [`ClientEvent`]s, and executes
//! the returned [`ClientAction`]s (emit, publish, log).

use veil_core::{ConnectionState, Message};
use veil_proto::{ClientPayload, ServerPayload};

/// Log severity carried by [`ClientAction::Log`].
///
/// The driver maps these onto its tracing backend; the state machine
/// itself stays free of logging dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Expected noise (dropped no-ops).
    Debug,
    /// Lifecycle milestones.
    Info,
    /// Degraded or garbled messages.
    Warn,
    /// Reserved for driver-level failures.
    Error,
}

/// Events fed into [`crate::Client::handle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// `connect()` was issued; the transport is dialing.
    ConnectRequested,
    /// The transport reports the connection is up.
    TransportConnected,
    /// The transport reports the connection dropped.
    TransportDisconnected,
    /// Application intent: enter a group.
    JoinGroup {
        /// Target group.
        group_id: String,
        /// Display name to announce.
        username: String,
    },
    /// Application intent: leave a group.
    LeaveGroup {
        /// Target group.
        group_id: String,
        /// Display name to announce.
        username: String,
    },
    /// Application intent: send a message.
    SendMessage {
        /// Target group.
        group_id: String,
        /// Plaintext to deliver.
        text: String,
        /// Sender display name.
        username: String,
    },
    /// The presentation layer switched groups; the backlog is stale.
    ActiveGroupChanged,
    /// A payload arrived from the server.
    Inbound(ServerPayload),
}

/// Actions returned by [`crate::Client::handle`] for the driver to
/// execute, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientAction {
    /// Hand this payload to the transport collaborator.
    Emit(ClientPayload),
    /// Deliver this decoded message to subscribers and the store.
    Publish(Message),
    /// The connection state changed; update subscribers.
    ConnectionChanged(ConnectionState),
    /// Empty the message store.
    ClearMessages,
    /// Emit a log line.
    Log {
        /// Severity of the line.
        level: LogLevel,
        /// Preformatted message.
        message: String,
    },
}

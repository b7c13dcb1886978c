//! Veil session driver.
//!
//! This crate wires the pure client state machine to real resources:
//! a transport implementation, the Tokio runtime, system randomness,
//! and the subscriber channels the presentation layer consumes.
//!
//! ## Architecture
//!
//! ```text
//! veil-session
//!   ├─ SystemEnv        (production Environment impl)
//!   ├─ Session          (single sequential event loop)
//!   ├─ SessionHandle    (commands + subscriber surface)
//!   ├─ MessageStore     (shared append log, driver is sole writer)
//!   └─ DirectoryClient  (group-directory HTTP collaborator)
//! ```
//!
//! One task per session processes commands and transport events
//! strictly in arrival order, so decrypt-and-append is atomic with
//! respect to other inbound messages and the group-key cache never
//! sees concurrent writers. On every exit path the loop closes the
//! transport before returning; afterwards handle operations become
//! permanent no-ops.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod directory;
mod system_env;

use std::sync::{Arc, Mutex, PoisonError};

use tokio::{
    sync::{broadcast, mpsc, oneshot, watch},
    task::JoinHandle,
};
use veil_client::{Client, ClientAction, ClientEvent, LogLevel};
use veil_core::{Environment, MessageStore, Transport};

pub use config::SessionConfig;
pub use directory::{DirectoryClient, DirectoryError};
pub use system_env::SystemEnv;
pub use veil_core::{ConnectionState, Message};
pub use veil_crypto::{generate_anonymous_id, hash_data};

/// Commands accepted by the session task.
#[derive(Debug)]
enum Command {
    Join { group_id: String, username: String },
    Leave { group_id: String, username: String },
    Send { group_id: String, text: String, username: String },
    ChangeActiveGroup,
    ExportPublicKey { reply: oneshot::Sender<Option<String>> },
    Shutdown,
}

/// A running messaging session.
///
/// Constructed via [`Session::spawn`], which returns the caller-facing
/// [`SessionHandle`] plus the join handle of the session task (useful
/// for deterministic teardown in tests and embedders).
pub struct Session;

impl Session {
    /// Spawns the session event loop onto the current Tokio runtime.
    ///
    /// The transport is owned by the spawned task from here on and is
    /// closed on every exit path: shutdown command, all handles
    /// dropped, or the transport ending its own event stream.
    pub fn spawn<T, E>(
        config: SessionConfig,
        transport: T,
        env: E,
    ) -> (SessionHandle, JoinHandle<()>)
    where
        T: Transport + 'static,
        E: Environment,
    {
        let (commands_tx, commands_rx) = mpsc::channel(64);
        let (messages_tx, _) = broadcast::channel(config.subscriber_capacity.max(1));
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let store = Arc::new(Mutex::new(MessageStore::new()));

        let handle = SessionHandle {
            commands: commands_tx,
            store: Arc::clone(&store),
            messages: messages_tx.clone(),
            state: state_rx,
        };

        let task = tokio::spawn(run(config, transport, env, commands_rx, store, messages_tx, state_tx));

        (handle, task)
    }
}

/// Caller-facing surface of a session.
///
/// Cheap to clone; all clones drive the same session task. Once the
/// session has shut down every operation here is a silent no-op;
/// the presentation layer reflects the published [`ConnectionState`]
/// instead of receiving per-call errors.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    store: Arc<Mutex<MessageStore>>,
    messages: broadcast::Sender<Message>,
    state: watch::Receiver<ConnectionState>,
}

impl SessionHandle {
    /// Requests joining a group. Dropped (not queued) while the
    /// session is not connected.
    pub async fn join_group(&self, group_id: &str, username: &str) {
        let _ = self
            .commands
            .send(Command::Join { group_id: group_id.to_owned(), username: username.to_owned() })
            .await;
    }

    /// Requests leaving a group. Same no-op semantics as joining.
    pub async fn leave_group(&self, group_id: &str, username: &str) {
        let _ = self
            .commands
            .send(Command::Leave { group_id: group_id.to_owned(), username: username.to_owned() })
            .await;
    }

    /// Sends a message to a group, encrypting on the way out.
    /// Whitespace-only text is dropped before any crypto work.
    pub async fn send_message(&self, group_id: &str, text: &str, username: &str) {
        let _ = self
            .commands
            .send(Command::Send {
                group_id: group_id.to_owned(),
                text: text.to_owned(),
                username: username.to_owned(),
            })
            .await;
    }

    /// Notifies the session that the active group changed, clearing
    /// the message backlog.
    pub async fn change_active_group(&self) {
        let _ = self.commands.send(Command::ChangeActiveGroup).await;
    }

    /// Exports the session public key (base64 SPKI), generating the
    /// keypair lazily. `None` when export is unavailable or the
    /// session already shut down.
    pub async fn export_public_key(&self) -> Option<String> {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.commands.send(Command::ExportPublicKey { reply: reply_tx }).await.is_err() {
            return None;
        }
        reply_rx.await.ok().flatten()
    }

    /// Subscribes to decoded messages in arrival order.
    pub fn subscribe_messages(&self) -> broadcast::Receiver<Message> {
        self.messages.subscribe()
    }

    /// Current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Watch channel over connection-state changes.
    pub fn watch_connection(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Snapshot of the stored messages for one group, in arrival
    /// order.
    pub fn messages_for(&self, group_id: &str) -> Vec<Message> {
        lock_store(&self.store).filter_by_group(group_id)
    }

    /// Snapshot of every stored message.
    pub fn all_messages(&self) -> Vec<Message> {
        lock_store(&self.store).messages().to_vec()
    }

    /// Asks the session task to stop. Teardown (transport close) is
    /// performed by the task itself; await the join handle returned by
    /// [`Session::spawn`] for completion.
    pub async fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown).await;
    }
}

fn lock_store(store: &Arc<Mutex<MessageStore>>) -> std::sync::MutexGuard<'_, MessageStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The single sequential event loop.
async fn run<T, E>(
    config: SessionConfig,
    mut transport: T,
    env: E,
    mut commands: mpsc::Receiver<Command>,
    store: Arc<Mutex<MessageStore>>,
    messages: broadcast::Sender<Message>,
    state: watch::Sender<ConnectionState>,
) where
    T: Transport,
    E: Environment,
{
    let mut client = Client::new(env);

    let actions = client.handle(ClientEvent::ConnectRequested);
    execute_actions(actions, &mut transport, &store, &messages, &state).await;

    if let Err(e) = transport.connect(&config.server_url).await {
        // The collaborator owns reconnection; nothing to do but log.
        tracing::warn!("transport connect failed: {}", e);
    }

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                None | Some(Command::Shutdown) => break,
                Some(Command::ExportPublicKey { reply }) => {
                    let _ = reply.send(client.export_public_key());
                },
                Some(command) => {
                    if let Some(event) = command_event(command) {
                        let actions = client.handle(event);
                        execute_actions(actions, &mut transport, &store, &messages, &state).await;
                    }
                },
            },
            event = transport.next_event() => match event {
                None => break,
                Some(event) => {
                    let actions = client.handle(transport_event(event));
                    execute_actions(actions, &mut transport, &store, &messages, &state).await;
                },
            },
        }
    }

    // Guaranteed teardown on every exit path.
    transport.close().await;
    let _ = state.send(ConnectionState::Disconnected);
    tracing::debug!("session task finished");
}

/// Maps a queued command onto a state-machine event. `None` for the
/// commands the loop answers itself (export, shutdown).
fn command_event(command: Command) -> Option<ClientEvent> {
    match command {
        Command::Join { group_id, username } => {
            Some(ClientEvent::JoinGroup { group_id, username })
        },
        Command::Leave { group_id, username } => {
            Some(ClientEvent::LeaveGroup { group_id, username })
        },
        Command::Send { group_id, text, username } => {
            Some(ClientEvent::SendMessage { group_id, text, username })
        },
        Command::ChangeActiveGroup => Some(ClientEvent::ActiveGroupChanged),
        Command::ExportPublicKey { .. } | Command::Shutdown => None,
    }
}

fn transport_event(event: veil_core::TransportEvent) -> ClientEvent {
    match event {
        veil_core::TransportEvent::Connected => ClientEvent::TransportConnected,
        veil_core::TransportEvent::Disconnected => ClientEvent::TransportDisconnected,
        veil_core::TransportEvent::Inbound(payload) => ClientEvent::Inbound(payload),
    }
}

/// Executes client actions in order.
async fn execute_actions<T: Transport>(
    actions: Vec<ClientAction>,
    transport: &mut T,
    store: &Arc<Mutex<MessageStore>>,
    messages: &broadcast::Sender<Message>,
    state: &watch::Sender<ConnectionState>,
) {
    for action in actions {
        match action {
            ClientAction::Emit(payload) => {
                if let Err(e) = transport.emit(payload).await {
                    tracing::warn!("transport emit failed: {}", e);
                }
            },

            ClientAction::Publish(message) => {
                lock_store(store).append(message.clone());
                // No receivers is fine; the store still has the log.
                let _ = messages.send(message);
            },

            ClientAction::ConnectionChanged(new_state) => {
                let _ = state.send(new_state);
            },

            ClientAction::ClearMessages => {
                lock_store(store).clear();
            },

            ClientAction::Log { level, message } => match level {
                LogLevel::Debug => tracing::debug!("{}", message),
                LogLevel::Info => tracing::info!("{}", message),
                LogLevel::Warn => tracing::warn!("{}", message),
                LogLevel::Error => tracing::error!("{}", message),
            },
        }
    }
}

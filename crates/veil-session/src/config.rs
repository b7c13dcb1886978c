//! Session configuration.

/// Configuration supplied when a session is spawned.
///
/// Both service addresses are explicit constructor inputs; the
/// defaults below exist for development convenience only and point at
/// a loopback deployment of the messaging service.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Realtime messaging service address handed to the transport
    /// collaborator.
    pub server_url: String,
    /// Base URL of the group-directory HTTP service.
    pub directory_url: String,
    /// Buffered capacity of the per-session message broadcast channel.
    /// Slow subscribers that fall further behind than this lose the
    /// oldest updates (standard broadcast-lag semantics).
    pub subscriber_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:5000".to_string(),
            directory_url: "http://localhost:5000".to_string(),
            subscriber_capacity: 256,
        }
    }
}

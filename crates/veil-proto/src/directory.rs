//! Group-directory records.
//!
//! The directory is an HTTP collaborator outside the messaging core;
//! callers use its responses only to derive a group id to join.

use serde::{Deserialize, Serialize};

/// A group as described by the directory service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// Directory-assigned group identifier.
    pub id: String,
    /// Human-readable group name.
    pub name: String,
    /// Shareable invite link.
    pub link: String,
    /// Member count at response time.
    #[serde(default)]
    pub members: u64,
    /// Directory-formatted creation timestamp.
    pub created: String,
}

/// Request body for group creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateGroupRequest {
    /// Name for the new group.
    pub name: String,
}

//! Group-directory HTTP client.
//!
//! The directory service creates groups and resolves invites. The
//! messaging core treats both calls as opaque request/response pairs
//! whose only consumed output is a group id to join.

use thiserror::Error;
use veil_proto::directory::{CreateGroupRequest, Group};

/// Directory request failure (connection, status, or decode).
#[derive(Debug, Error)]
#[error(transparent)]
pub struct DirectoryError(#[from] reqwest::Error);

/// Thin client for the group-directory collaborator.
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    http: reqwest::Client,
    base_url: String,
}

impl DirectoryClient {
    /// Creates a client against a directory base URL
    /// (e.g. `http://localhost:5000`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.into() }
    }

    /// Creates a named group and returns its directory record.
    pub async fn create_group(&self, name: &str) -> Result<Group, DirectoryError> {
        let url = format!("{}/api/groups", self.base_url);
        let request = CreateGroupRequest { name: name.to_owned() };

        let group = self
            .http
            .post(url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<Group>()
            .await?;
        Ok(group)
    }

    /// Resolves an existing group by id, as when following an invite
    /// link.
    pub async fn join_group(&self, group_id: &str) -> Result<Group, DirectoryError> {
        let url = format!("{}/api/groups/{group_id}/join", self.base_url);

        let group =
            self.http.post(url).send().await?.error_for_status()?.json::<Group>().await?;
        Ok(group)
    }
}

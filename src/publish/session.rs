//! Per-caller repository sessions.
//!
//! A [`RepositorySession`] binds one validated credential (inside its
//! host) to a caller-supplied id. The [`SessionRegistry`] keeps sessions
//! apart so concurrent callers never share a credential.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{HostError, PublishError, PublishRequest, Publisher, RepositoryHost, UserProfile};
use crate::models::PullRequestInfo;

/// A validated connection to a repository host.
pub struct RepositorySession {
    id: String,
    host: Arc<dyn RepositoryHost>,
    user: UserProfile,
}

impl std::fmt::Debug for RepositorySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositorySession")
            .field("id", &self.id)
            .field("user", &self.user.login)
            .finish_non_exhaustive()
    }
}

impl RepositorySession {
    /// Validate the host's credential and open a session.
    pub async fn connect(
        id: impl Into<String>,
        host: Arc<dyn RepositoryHost>,
    ) -> Result<Self, PublishError> {
        let user = host.authenticate().await.map_err(PublishError::Unauthorized)?;
        let id = id.into();
        tracing::info!(session = %id, user = %user.login, "repository session opened");
        Ok(Self { id, host, user })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The account the session's credential belongs to.
    pub fn user(&self) -> &UserProfile {
        &self.user
    }

    pub async fn list_repositories(&self) -> Result<Vec<String>, HostError> {
        self.host.list_repositories().await
    }

    pub async fn list_branches(&self, repo: &str) -> Result<Vec<String>, HostError> {
        self.host.list_branches(repo).await
    }

    /// Publish `request` as a pull request with this session's credential.
    pub async fn publish(&self, request: &PublishRequest) -> Result<PullRequestInfo, PublishError> {
        Publisher::new(self.host.as_ref()).publish(request).await
    }
}

/// Sessions keyed by caller-provided id.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<RepositorySession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `host` and register it under `id`, replacing any
    /// previous session with that id.
    pub async fn connect(
        &self,
        id: &str,
        host: Arc<dyn RepositoryHost>,
    ) -> Result<Arc<RepositorySession>, PublishError> {
        let session = Arc::new(RepositorySession::connect(id, host).await?);
        self.write().insert(id.to_string(), Arc::clone(&session));
        Ok(session)
    }

    pub fn get(&self, id: &str) -> Option<Arc<RepositorySession>> {
        self.read().get(id).cloned()
    }

    /// Drop a session; returns whether one existed.
    pub fn disconnect(&self, id: &str) -> bool {
        self.write().remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<RepositorySession>>> {
        self.sessions.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Arc<RepositorySession>>> {
        self.sessions.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

//! Checkpoint session storage.
//!
//! Sessions are keyed by slug. The store only persists records; every
//! transition rule lives in [`CheckpointSession`](super::CheckpointSession).
//!
//! # Implementation Notes
//!
//! `update` must apply the mutation atomically with respect to other
//! writers for the same slug, and must not persist anything when the
//! mutation returns an error. Two concurrent confirms for one session
//! must never both advance it.

use async_trait::async_trait;
use dashmap::DashMap;
use time::OffsetDateTime;

use super::machine::{CheckpointError, CheckpointSession};

/// A mutation applied to a stored session under the store's lock.
pub type SessionUpdate =
    Box<dyn FnOnce(&mut CheckpointSession) -> Result<(), CheckpointError> + Send>;

/// Storage trait for checkpoint sessions.
///
/// # Implementations
///
/// - [`InMemoryCheckpointStore`] - process-local store backed by `DashMap`
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Returns the session for `slug`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn get(&self, slug: &str) -> Result<Option<CheckpointSession>, CheckpointError>;

    /// Returns the session for `slug`, inserting `fresh` if none exists.
    ///
    /// An existing session is never replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn get_or_create(
        &self,
        fresh: CheckpointSession,
    ) -> Result<CheckpointSession, CheckpointError>;

    /// Atomically applies `apply` to the session for `slug`.
    ///
    /// # Returns
    ///
    /// The updated session.
    ///
    /// # Errors
    ///
    /// - `SessionNotFound` if no session exists
    /// - whatever `apply` returns, in which case the stored session is unchanged
    async fn update(
        &self,
        slug: &str,
        apply: SessionUpdate,
    ) -> Result<CheckpointSession, CheckpointError>;

    /// Deletes sessions created before `cutoff`.
    ///
    /// # Returns
    ///
    /// The number of sessions deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the cleanup operation fails.
    async fn cleanup_created_before(&self, cutoff: OffsetDateTime) -> Result<u64, CheckpointError>;
}

/// In-memory session store.
///
/// Sessions are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryCheckpointStore {
    sessions: DashMap<String, CheckpointSession>,
}

impl InMemoryCheckpointStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if the store holds no sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn get(&self, slug: &str) -> Result<Option<CheckpointSession>, CheckpointError> {
        Ok(self.sessions.get(slug).map(|s| s.value().clone()))
    }

    async fn get_or_create(
        &self,
        fresh: CheckpointSession,
    ) -> Result<CheckpointSession, CheckpointError> {
        let entry = self
            .sessions
            .entry(fresh.slug.clone())
            .or_insert(fresh);
        Ok(entry.value().clone())
    }

    async fn update(
        &self,
        slug: &str,
        apply: SessionUpdate,
    ) -> Result<CheckpointSession, CheckpointError> {
        let mut entry = self
            .sessions
            .get_mut(slug)
            .ok_or(CheckpointError::SessionNotFound)?;

        // Mutate a copy so a failed transition leaves the record untouched.
        let mut next = entry.value().clone();
        apply(&mut next)?;
        *entry.value_mut() = next.clone();
        Ok(next)
    }

    async fn cleanup_created_before(&self, cutoff: OffsetDateTime) -> Result<u64, CheckpointError> {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.created_at >= cutoff);
        Ok(before.saturating_sub(self.sessions.len()) as u64)
    }
}

//! Checkpoint flow.
//!
//! [`CheckpointMachine`] binds the pure session transitions in
//! [`machine`] to a [`CheckpointStore`] and the configured window.

pub mod machine;
pub mod storage;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use time::OffsetDateTime;

pub use machine::{CheckpointError, CheckpointSession, CheckpointState, PendingCheckpoint};
pub use storage::{CheckpointStore, InMemoryCheckpointStore, SessionUpdate};

use crate::config::CheckpointConfig;

/// Longest accepted session slug.
pub const MAX_SLUG_LEN: usize = 64;

/// Public view of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub slug: String,
    pub uid: Option<String>,
    pub service: String,
    pub state: CheckpointState,
    pub cp1: bool,
    pub cp2: bool,
    pub complete: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&CheckpointSession> for SessionView {
    fn from(session: &CheckpointSession) -> Self {
        Self {
            slug: session.slug.clone(),
            uid: session.uid.clone(),
            service: session.service.clone(),
            state: session.state,
            cp1: session.is_step_done(1),
            cp2: session.is_step_done(2),
            complete: session.is_complete(),
            created_at: session.created_at,
        }
    }
}

/// Drives checkpoint sessions stored in a [`CheckpointStore`].
#[derive(Clone)]
pub struct CheckpointMachine {
    store: Arc<dyn CheckpointStore>,
    window: Duration,
    session_ttl: Duration,
}

impl CheckpointMachine {
    /// Creates a machine over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn CheckpointStore>, config: &CheckpointConfig) -> Self {
        Self {
            store,
            window: config.window,
            session_ttl: config.session_ttl,
        }
    }

    /// Creates a machine with a fresh in-memory store.
    #[must_use]
    pub fn in_memory(config: &CheckpointConfig) -> Self {
        Self::new(Arc::new(InMemoryCheckpointStore::new()), config)
    }

    /// Configured confirmation window.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Returns the session for `slug`, creating it if needed.
    ///
    /// `uid` and `service` only apply when the session is created.
    ///
    /// # Errors
    /// - `InvalidSlug` if the slug is malformed
    /// - `Storage` if the store fails
    pub async fn open(
        &self,
        slug: &str,
        uid: Option<String>,
        service: Option<String>,
    ) -> Result<CheckpointSession, CheckpointError> {
        validate_slug(slug)?;
        let fresh = CheckpointSession::new(
            slug,
            uid.filter(|u| !u.trim().is_empty()),
            service.filter(|s| !s.trim().is_empty()),
            OffsetDateTime::now_utc(),
        );
        self.store.get_or_create(fresh).await
    }

    /// Returns the session for `slug` without creating it.
    ///
    /// # Errors
    /// - `InvalidSlug` if the slug is malformed
    /// - `SessionNotFound` if no session exists
    pub async fn get(&self, slug: &str) -> Result<CheckpointSession, CheckpointError> {
        validate_slug(slug)?;
        self.store
            .get(slug)
            .await?
            .ok_or(CheckpointError::SessionNotFound)
    }

    /// Starts checkpoint `step`.
    ///
    /// # Errors
    /// - `SessionNotFound` if no session exists
    /// - `InvalidSequence` if `step` is not the next expected step
    pub async fn start(&self, slug: &str, step: u8) -> Result<CheckpointSession, CheckpointError> {
        self.start_at(slug, step, OffsetDateTime::now_utc()).await
    }

    /// Starts checkpoint `step` at an explicit time.
    ///
    /// # Errors
    /// See [`start`](Self::start).
    pub async fn start_at(
        &self,
        slug: &str,
        step: u8,
        now: OffsetDateTime,
    ) -> Result<CheckpointSession, CheckpointError> {
        validate_slug(slug)?;
        let session = self
            .store
            .update(slug, Box::new(move |s| s.start(step, now)))
            .await?;
        tracing::debug!(slug = %slug, step, "checkpoint started");
        Ok(session)
    }

    /// Confirms checkpoint `step`.
    ///
    /// # Errors
    /// - `SessionNotFound` if no session exists
    /// - `WindowExpired` if the window elapsed since the start
    /// - `InvalidSequence` if nothing or another step is pending
    pub async fn confirm(&self, slug: &str, step: u8) -> Result<CheckpointSession, CheckpointError> {
        self.confirm_at(slug, step, OffsetDateTime::now_utc()).await
    }

    /// Confirms checkpoint `step` at an explicit time.
    ///
    /// # Errors
    /// See [`confirm`](Self::confirm).
    pub async fn confirm_at(
        &self,
        slug: &str,
        step: u8,
        now: OffsetDateTime,
    ) -> Result<CheckpointSession, CheckpointError> {
        validate_slug(slug)?;
        let window = self.window;
        let session = self
            .store
            .update(
                slug,
                Box::new(move |s| s.confirm(step, now, window).map(|_| ())),
            )
            .await
            .inspect_err(|e| tracing::debug!(slug = %slug, step, error = %e, "checkpoint rejected"))?;
        tracing::info!(
            slug = %slug,
            step,
            state = ?session.state,
            "checkpoint confirmed"
        );
        Ok(session)
    }

    /// Removes sessions older than the configured session TTL.
    ///
    /// # Errors
    /// Returns `Storage` if the store fails or the cutoff is out of range.
    pub async fn sweep(&self) -> Result<u64, CheckpointError> {
        self.sweep_at(OffsetDateTime::now_utc()).await
    }

    /// Removes sessions created more than the session TTL before `now`.
    ///
    /// # Errors
    /// Same as [`Self::sweep`].
    pub async fn sweep_at(&self, now: OffsetDateTime) -> Result<u64, CheckpointError> {
        let cutoff = time::Duration::try_from(self.session_ttl)
            .ok()
            .and_then(|ttl| now.checked_sub(ttl))
            .ok_or_else(|| {
                CheckpointError::storage(format!(
                    "session ttl {:?} is out of range for sweeping",
                    self.session_ttl
                ))
            })?;
        let removed = self.store.cleanup_created_before(cutoff).await?;
        if removed > 0 {
            tracing::debug!(removed, "swept stale checkpoint sessions");
        }
        Ok(removed)
    }
}

/// Accepts slugs of 1 to [`MAX_SLUG_LEN`] ASCII alphanumerics, `-` or `_`.
fn validate_slug(slug: &str) -> Result<(), CheckpointError> {
    let ok = !slug.is_empty()
        && slug.len() <= MAX_SLUG_LEN
        && slug
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if ok {
        Ok(())
    } else {
        Err(CheckpointError::InvalidSlug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> CheckpointMachine {
        CheckpointMachine::in_memory(&CheckpointConfig::default())
    }

    #[tokio::test]
    async fn test_open_creates_once() {
        let m = machine();
        let a = m.open("abc", Some("12345".into()), None).await.unwrap();
        let b = m.open("abc", Some("other".into()), Some("roles".into())).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(b.uid.as_deref(), Some("12345"));
        assert_eq!(b.service, "default");
    }

    #[tokio::test]
    async fn test_invalid_slug() {
        let m = machine();
        assert_eq!(m.open("", None, None).await.unwrap_err(), CheckpointError::InvalidSlug);
        assert_eq!(m.open("a/b", None, None).await.unwrap_err(), CheckpointError::InvalidSlug);
        let long = "a".repeat(MAX_SLUG_LEN + 1);
        assert_eq!(m.start(&long, 1).await.unwrap_err(), CheckpointError::InvalidSlug);
    }

    #[tokio::test]
    async fn test_confirm_unknown_session() {
        let m = machine();
        assert_eq!(
            m.confirm("missing", 1).await.unwrap_err(),
            CheckpointError::SessionNotFound
        );
        assert_eq!(m.get("missing").await.unwrap_err(), CheckpointError::SessionNotFound);
    }

    #[tokio::test]
    async fn test_full_flow() {
        let m = machine();
        m.open("abc", None, None).await.unwrap();

        m.start("abc", 1).await.unwrap();
        let s = m.confirm("abc", 1).await.unwrap();
        assert_eq!(s.state, CheckpointState::PendingCp2);

        m.start("abc", 2).await.unwrap();
        let s = m.confirm("abc", 2).await.unwrap();
        assert!(s.is_complete());

        let view = SessionView::from(&m.get("abc").await.unwrap());
        assert!(view.cp1 && view.cp2 && view.complete);
    }

    #[tokio::test]
    async fn test_window_expired_via_store() {
        let m = machine();
        m.open("abc", None, None).await.unwrap();

        let started = OffsetDateTime::now_utc();
        m.start_at("abc", 1, started).await.unwrap();
        let err = m
            .confirm_at("abc", 1, started + m.window())
            .await
            .unwrap_err();
        assert_eq!(err, CheckpointError::WindowExpired);

        let s = m.get("abc").await.unwrap();
        assert_eq!(s.state, CheckpointState::PendingCp1);
    }

    #[tokio::test]
    async fn test_double_confirm_advances_once() {
        let m = machine();
        m.open("abc", None, None).await.unwrap();
        m.start("abc", 1).await.unwrap();

        m.confirm("abc", 1).await.unwrap();
        assert_eq!(
            m.confirm("abc", 1).await.unwrap_err(),
            CheckpointError::InvalidSequence
        );
        assert_eq!(m.get("abc").await.unwrap().state, CheckpointState::PendingCp2);
    }

    #[tokio::test]
    async fn test_sweep_keeps_fresh_sessions() {
        let m = machine();
        m.open("abc", None, None).await.unwrap();
        assert_eq!(m.sweep().await.unwrap(), 0);
        assert!(m.get("abc").await.is_ok());
    }

    #[tokio::test]
    async fn test_sweep_drops_expired_sessions() {
        let m = machine();
        m.open("abc", None, None).await.unwrap();
        let later = OffsetDateTime::now_utc() + time::Duration::days(2);
        assert_eq!(m.sweep_at(later).await.unwrap(), 1);
        assert_eq!(m.get("abc").await.unwrap_err(), CheckpointError::SessionNotFound);
    }

    #[tokio::test]
    async fn test_sweep_with_out_of_range_ttl_errors() {
        let config: CheckpointConfig =
            serde_json::from_str(r#"{"session_ttl": "100000years"}"#).unwrap();
        let m = CheckpointMachine::in_memory(&config);
        m.open("abc", None, None).await.unwrap();

        let err = m.sweep().await.unwrap_err();
        assert!(matches!(err, CheckpointError::Storage { .. }));
        assert!(m.get("abc").await.is_ok());
    }

    #[test]
    fn test_session_view_shape() {
        let session = CheckpointSession::new(
            "abc",
            None,
            None,
            time::macros::datetime!(2025-01-01 0:00 UTC),
        );
        let json = serde_json::to_value(SessionView::from(&session)).unwrap();
        assert_eq!(json["state"], "pending_cp1");
        assert_eq!(json["cp1"], false);
        assert_eq!(json["service"], "default");
        assert_eq!(json["created_at"], "2025-01-01T00:00:00Z");
    }
}

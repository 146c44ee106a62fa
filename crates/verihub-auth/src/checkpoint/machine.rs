//! Checkpoint session state machine.
//!
//! A session moves `PendingCp1 -> PendingCp2 -> Complete`. Each step is
//! started (the user leaves for the checkpoint link) and later confirmed
//! (the user comes back). A confirmation only counts if it arrives within
//! the configured window after the matching start.
//!
//! This machine carries no integrity guarantee and is never consulted by
//! token validation.

use std::time::Duration;

use serde::Serialize;
use time::OffsetDateTime;

/// Errors returned by checkpoint operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckpointError {
    /// The session slug is empty or contains unsupported characters.
    #[error("Invalid session slug")]
    InvalidSlug,

    /// No session exists for the slug.
    #[error("Session expired or invalid")]
    SessionNotFound,

    /// The confirmation arrived after the checkpoint window closed.
    #[error("Checkpoint window expired")]
    WindowExpired,

    /// The step does not match the session's progress.
    #[error("Invalid verification sequence")]
    InvalidSequence,

    /// The backing store failed.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },
}

impl CheckpointError {
    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

/// Progress of a checkpoint session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointState {
    /// Waiting for checkpoint 1.
    PendingCp1,
    /// Checkpoint 1 done, waiting for checkpoint 2.
    PendingCp2,
    /// Both checkpoints done.
    Complete,
}

impl CheckpointState {
    /// Step number expected next, or `None` once complete.
    #[must_use]
    pub fn expected_step(self) -> Option<u8> {
        match self {
            Self::PendingCp1 => Some(1),
            Self::PendingCp2 => Some(2),
            Self::Complete => None,
        }
    }

    fn advance(self) -> Self {
        match self {
            Self::PendingCp1 => Self::PendingCp2,
            Self::PendingCp2 | Self::Complete => Self::Complete,
        }
    }
}

/// A started but unconfirmed checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PendingCheckpoint {
    /// Step that was started.
    pub step: u8,
    /// When the step was started.
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
}

/// A checkpoint session record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckpointSession {
    /// Session key.
    pub slug: String,
    /// Identity the session was opened for, if known.
    pub uid: Option<String>,
    /// Caller-supplied label.
    pub service: String,
    /// Current progress.
    pub state: CheckpointState,
    /// Started checkpoint awaiting confirmation.
    pub pending: Option<PendingCheckpoint>,
    /// When the session was opened.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl CheckpointSession {
    /// Label used when the caller supplies none.
    pub const DEFAULT_SERVICE: &'static str = "default";

    /// Opens a fresh session.
    #[must_use]
    pub fn new(
        slug: impl Into<String>,
        uid: Option<String>,
        service: Option<String>,
        now: OffsetDateTime,
    ) -> Self {
        Self {
            slug: slug.into(),
            uid,
            service: service.unwrap_or_else(|| Self::DEFAULT_SERVICE.to_string()),
            state: CheckpointState::PendingCp1,
            pending: None,
            created_at: now,
        }
    }

    /// Returns `true` once every checkpoint is confirmed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state == CheckpointState::Complete
    }

    /// Returns `true` if checkpoint `step` has been confirmed.
    #[must_use]
    pub fn is_step_done(&self, step: u8) -> bool {
        match self.state.expected_step() {
            Some(expected) => step < expected,
            None => true,
        }
    }

    /// Records that the user started checkpoint `step`.
    ///
    /// Restarting the current step replaces the previous start.
    ///
    /// # Errors
    /// Returns `InvalidSequence` if `step` is not the next expected step.
    pub fn start(&mut self, step: u8, now: OffsetDateTime) -> Result<(), CheckpointError> {
        if self.state.expected_step() != Some(step) {
            return Err(CheckpointError::InvalidSequence);
        }
        self.pending = Some(PendingCheckpoint {
            step,
            started_at: now,
        });
        Ok(())
    }

    /// Confirms checkpoint `step`, advancing the session.
    ///
    /// The window is checked before the step: a stale start reports
    /// `WindowExpired` even if the step is also wrong.
    ///
    /// # Errors
    /// - `WindowExpired` if `window` has elapsed since the start
    /// - `InvalidSequence` if nothing is pending or a different step is pending
    pub fn confirm(
        &mut self,
        step: u8,
        now: OffsetDateTime,
        window: Duration,
    ) -> Result<CheckpointState, CheckpointError> {
        let pending = self.pending.ok_or(CheckpointError::InvalidSequence)?;

        let elapsed_ms = (now - pending.started_at).whole_milliseconds();
        if elapsed_ms >= window.as_millis() as i128 {
            return Err(CheckpointError::WindowExpired);
        }

        if pending.step != step {
            return Err(CheckpointError::InvalidSequence);
        }

        self.state = self.state.advance();
        self.pending = None;
        Ok(self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const WINDOW: Duration = Duration::from_secs(600);

    fn session() -> CheckpointSession {
        CheckpointSession::new("abc", Some("12345".into()), None, datetime!(2025-01-01 0:00 UTC))
    }

    #[test]
    fn test_new_session_defaults() {
        let s = session();
        assert_eq!(s.state, CheckpointState::PendingCp1);
        assert_eq!(s.service, "default");
        assert!(s.pending.is_none());
        assert!(!s.is_complete());
        assert!(!s.is_step_done(1));
    }

    #[test]
    fn test_full_flow() {
        let mut s = session();
        let t0 = datetime!(2025-01-01 0:01 UTC);

        s.start(1, t0).unwrap();
        assert_eq!(
            s.confirm(1, t0 + time::Duration::minutes(2), WINDOW).unwrap(),
            CheckpointState::PendingCp2
        );
        assert!(s.is_step_done(1));
        assert!(!s.is_step_done(2));

        s.start(2, t0 + time::Duration::minutes(3)).unwrap();
        assert_eq!(
            s.confirm(2, t0 + time::Duration::minutes(4), WINDOW).unwrap(),
            CheckpointState::Complete
        );
        assert!(s.is_complete());
        assert!(s.is_step_done(2));
        assert!(s.pending.is_none());
    }

    #[test]
    fn test_cannot_skip_steps() {
        let mut s = session();
        let now = datetime!(2025-01-01 0:01 UTC);
        assert_eq!(s.start(2, now), Err(CheckpointError::InvalidSequence));
        assert_eq!(s.start(3, now), Err(CheckpointError::InvalidSequence));
    }

    #[test]
    fn test_confirm_without_start() {
        let mut s = session();
        let now = datetime!(2025-01-01 0:01 UTC);
        assert_eq!(s.confirm(1, now, WINDOW), Err(CheckpointError::InvalidSequence));
    }

    #[test]
    fn test_confirm_wrong_step() {
        let mut s = session();
        let now = datetime!(2025-01-01 0:01 UTC);
        s.start(1, now).unwrap();
        assert_eq!(s.confirm(2, now, WINDOW), Err(CheckpointError::InvalidSequence));
        assert_eq!(s.state, CheckpointState::PendingCp1);
        assert!(s.pending.is_some());
    }

    #[test]
    fn test_window_expired() {
        let mut s = session();
        let now = datetime!(2025-01-01 0:01 UTC);
        s.start(1, now).unwrap();
        assert_eq!(
            s.confirm(1, now + time::Duration::minutes(10), WINDOW),
            Err(CheckpointError::WindowExpired)
        );
        // Window is checked before the step.
        assert_eq!(
            s.confirm(2, now + time::Duration::minutes(11), WINDOW),
            Err(CheckpointError::WindowExpired)
        );
        assert_eq!(s.state, CheckpointState::PendingCp1);
    }

    #[test]
    fn test_restart_resets_window() {
        let mut s = session();
        let now = datetime!(2025-01-01 0:01 UTC);
        s.start(1, now).unwrap();
        s.start(1, now + time::Duration::minutes(20)).unwrap();
        assert!(s.confirm(1, now + time::Duration::minutes(25), WINDOW).is_ok());
    }

    #[test]
    fn test_complete_session_rejects_further_steps() {
        let mut s = session();
        s.state = CheckpointState::Complete;
        let now = datetime!(2025-01-01 0:01 UTC);
        assert_eq!(s.start(1, now), Err(CheckpointError::InvalidSequence));
        assert_eq!(s.start(2, now), Err(CheckpointError::InvalidSequence));
    }
}

//! # verihub-auth
//!
//! Verification core for the Verihub server.
//!
//! This crate provides:
//! - Signed, time-bounded verification tokens bound to a platform identity
//! - Validation of presented (identity, token) pairs
//! - Shared-secret authentication for callers allowed to issue tokens
//! - A two-step checkpoint session flow
//!
//! ## Modules
//!
//! - [`config`] - Token, caller and checkpoint configuration
//! - [`token`] - Token issuance and validation
//! - [`checkpoint`] - Checkpoint session state machine and storage
//! - [`middleware`] - Caller authentication and error responses
//! - [`http`] - Axum handlers

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod http;
pub mod middleware;
pub mod token;

pub use checkpoint::{
    CheckpointError, CheckpointMachine, CheckpointSession, CheckpointState, CheckpointStore,
    InMemoryCheckpointStore, SessionView,
};
pub use config::{AuthConfig, CallerConfig, CheckpointConfig, ConfigError, SecretString, TokenConfig};
pub use error::{AuthError, ErrorCategory};
pub use http::{
    VerifyState, confirm_checkpoint_handler, generate_handler, method_not_allowed,
    session_handler, start_checkpoint_handler, validate_handler, verify_handler,
};
pub use middleware::{CallerAuth, CallerKey};
pub use token::{IssuedToken, TokenIssuer, TokenSigner, TokenValidator, ValidatedIdentity};

/// Type alias for verification results.
pub type AuthResult<T> = Result<T, AuthError>;

//! Caller authentication extractor.
//!
//! Token issuance is restricted to callers that present the configured
//! shared secret in the `x-api-key` header.
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, routing::post};
//! use verihub_auth::middleware::CallerAuth;
//!
//! async fn generate(_caller: CallerAuth) -> &'static str {
//!     "trusted"
//! }
//!
//! let app = Router::new()
//!     .route("/generate", post(generate))
//!     .with_state(verify_state);
//! ```

use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use subtle::ConstantTimeEq;

use crate::config::{CallerConfig, SecretString};
use crate::error::AuthError;

/// Header carrying the caller's shared secret.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Message returned for a missing or wrong caller key.
pub const INVALID_API_KEY_MESSAGE: &str = "Invalid API key";

// =============================================================================
// Caller Key
// =============================================================================

/// Configured caller secret, shared through router state.
#[derive(Clone, Default)]
pub struct CallerKey {
    expected: Option<Arc<SecretString>>,
}

impl CallerKey {
    /// Creates a caller key. Blank keys are treated as unset.
    #[must_use]
    pub fn new(expected: Option<SecretString>) -> Self {
        Self {
            expected: expected.filter(|k| !k.is_empty()).map(Arc::new),
        }
    }

    /// Creates a caller key from configuration.
    #[must_use]
    pub fn from_config(config: &CallerConfig) -> Self {
        Self::new(config.api_key.clone())
    }

    /// Returns `true` if a caller key is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.expected.is_some()
    }

    /// Checks a presented key.
    ///
    /// # Errors
    /// - `Configuration` if no key is configured
    /// - `Unauthorized` if the presented key is missing or wrong
    pub fn verify(&self, presented: Option<&[u8]>) -> Result<(), AuthError> {
        let expected = self.expected.as_ref().ok_or_else(|| {
            tracing::error!("caller authentication refused: caller api key is not configured");
            AuthError::configuration("Server misconfigured (missing generator key)")
        })?;

        let presented = presented.ok_or_else(|| AuthError::unauthorized(INVALID_API_KEY_MESSAGE))?;

        if bool::from(presented.ct_eq(expected.expose().as_bytes())) {
            Ok(())
        } else {
            Err(AuthError::unauthorized(INVALID_API_KEY_MESSAGE))
        }
    }
}

impl std::fmt::Debug for CallerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallerKey")
            .field("configured", &self.is_configured())
            .finish()
    }
}

// =============================================================================
// Caller Auth Extractor
// =============================================================================

/// Proof that the request carried the configured caller key.
#[derive(Debug, Clone, Copy)]
pub struct CallerAuth;

impl<S> FromRequestParts<S> for CallerAuth
where
    S: Send + Sync,
    CallerKey: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let key = CallerKey::from_ref(state);
        let presented = parts
            .headers
            .get(API_KEY_HEADER)
            .map(|v| v.as_bytes());

        key.verify(presented).inspect_err(|e| {
            if e.is_authentication_error() {
                tracing::debug!("caller rejected: invalid api key");
            }
        })?;

        Ok(Self)
    }
}

// =============================================================================
// Tests
// =============================================================================

//! Token validation.

use std::sync::Arc;

use serde::Serialize;

use crate::AuthResult;
use crate::config::TokenConfig;
use crate::error::AuthError;

use super::claims::VerificationClaims;
use super::signer::TokenSigner;

/// Caller-facing summary for any signature, format or expiry failure.
pub const INVALID_TOKEN_MESSAGE: &str = "Invalid or expired token";

/// Caller-facing summary for a valid token presented with the wrong identity.
pub const MISMATCH_MESSAGE: &str = "Token does not match uid";

/// Identity proven by a successful validation.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ValidatedIdentity {
    /// The identity embedded in (and matching) the token.
    pub uid: String,
    /// Verified claims.
    #[serde(skip)]
    pub claims: VerificationClaims,
}

/// Checks presented (identity, token) pairs.
///
/// Validation is a pure check: it never marks a token as consumed, so a
/// valid token keeps validating until it expires.
pub struct TokenValidator {
    signer: Option<Arc<TokenSigner>>,
}

impl TokenValidator {
    /// Creates a validator around a shared signer.
    #[must_use]
    pub fn new(signer: Option<Arc<TokenSigner>>) -> Self {
        Self { signer }
    }

    /// Creates a validator with its own signer built from the configuration.
    #[must_use]
    pub fn from_config(config: &TokenConfig) -> Self {
        Self::new(super::signer_from_config(config))
    }

    /// Validates `token` against the claimed `identity`.
    ///
    /// # Errors
    /// - `InvalidRequest` if either input is missing
    /// - `Configuration` if no signing secret is configured
    /// - `InvalidToken` if the signature, payload or expiry check fails
    /// - `IdentityMismatch` if the token was issued for another identity
    pub fn validate(&self, identity: &str, token: &str) -> AuthResult<ValidatedIdentity> {
        if identity.trim().is_empty() || token.is_empty() {
            return Err(AuthError::invalid_request("Missing uid or token"));
        }

        let signer = self.signer.as_ref().ok_or_else(|| {
            tracing::error!("token validation refused: signing secret is not configured");
            AuthError::configuration("Server misconfigured (missing token secret)")
        })?;

        let claims = signer.verify(token).map_err(|e| {
            if e.is_rejection() {
                tracing::debug!(error = %e, "token rejected");
                AuthError::invalid_token(INVALID_TOKEN_MESSAGE)
            } else {
                tracing::error!(error = %e, "token verification failed");
                AuthError::internal("Failed to verify token")
            }
        })?;

        if claims.uid != identity {
            tracing::debug!(jti = %claims.jti, "token presented for a different uid");
            return Err(AuthError::identity_mismatch(MISMATCH_MESSAGE));
        }

        tracing::info!(uid = %claims.uid, jti = %claims.jti, "verification token validated");

        Ok(ValidatedIdentity {
            uid: claims.uid.clone(),
            claims,
        })
    }
}

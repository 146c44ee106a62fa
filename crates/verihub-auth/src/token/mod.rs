//! Verification token issuance and validation.
//!
//! This module provides:
//!
//! - The strict token payload schema ([`VerificationClaims`])
//! - The HS256 signing primitive ([`TokenSigner`])
//! - Token issuance with verification links ([`TokenIssuer`])
//! - Token validation against a claimed identity ([`TokenValidator`])

pub mod claims;
pub mod issuer;
pub mod signer;
pub mod validator;

use std::sync::Arc;

pub use claims::VerificationClaims;
pub use issuer::{IssuedToken, TokenIssuer, VERIFY_PATH};
pub use signer::{SignerError, TokenSigner};
pub use validator::{INVALID_TOKEN_MESSAGE, MISMATCH_MESSAGE, TokenValidator, ValidatedIdentity};

use crate::config::TokenConfig;

/// Builds the shared signer from the configured secret.
///
/// Returns `None` when no usable secret is configured, which makes the
/// issuer and validator fail closed.
#[must_use]
pub fn signer_from_config(config: &TokenConfig) -> Option<Arc<TokenSigner>> {
    let secret = config.secret.as_ref()?;
    match TokenSigner::from_secret(secret.expose()) {
        Ok(signer) => Some(Arc::new(signer)),
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unusable token secret");
            None
        }
    }
}

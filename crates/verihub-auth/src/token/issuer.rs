//! Token issuance.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::AuthResult;
use crate::config::TokenConfig;
use crate::error::AuthError;

use super::claims::VerificationClaims;
use super::signer::TokenSigner;

/// Path of the verification endpoint embedded in issued links.
pub const VERIFY_PATH: &str = "/verify";

/// Result of a successful issuance.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    /// The identity the token is bound to (trimmed).
    pub uid: String,
    /// The signed token.
    pub token: String,
    /// Verification link carrying `uid` and `token`.
    pub url: String,
    /// Configured time-to-live in human-readable form (e.g. `7days`).
    pub expires_in: String,
    /// Expiration time (Unix timestamp).
    pub expires_at: i64,
    /// Unique token identifier.
    #[serde(skip)]
    pub jti: uuid::Uuid,
    /// Caller-supplied label, echoed back but never signed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

/// Mints signed, time-bounded verification tokens.
pub struct TokenIssuer {
    signer: Option<Arc<TokenSigner>>,
    ttl: Duration,
    base_url: Option<String>,
}

impl TokenIssuer {
    /// Creates an issuer from a shared signer and the token configuration.
    ///
    /// A `None` signer means no secret is configured; every `issue` call
    /// then fails with a configuration error.
    #[must_use]
    pub fn new(signer: Option<Arc<TokenSigner>>, config: &TokenConfig) -> Self {
        Self {
            signer,
            ttl: config.ttl,
            base_url: config
                .base_url()
                .map(|b| b.trim_end_matches('/').to_string()),
        }
    }

    /// Creates an issuer with its own signer built from the configuration.
    #[must_use]
    pub fn from_config(config: &TokenConfig) -> Self {
        Self::new(super::signer_from_config(config), config)
    }

    /// Returns `true` if a signing secret is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.signer.is_some()
    }

    /// Issues a token for `identity`.
    ///
    /// # Errors
    /// - `InvalidRequest` if the identity is empty after trimming
    /// - `Configuration` if no signing secret is configured
    /// - `Internal` if signing fails
    pub fn issue(&self, identity: &str, service: Option<&str>) -> AuthResult<IssuedToken> {
        let uid = identity.trim();
        if uid.is_empty() {
            return Err(AuthError::invalid_request("Missing uid"));
        }

        let signer = self.signer.as_ref().ok_or_else(|| {
            tracing::error!("token issuance refused: signing secret is not configured");
            AuthError::configuration("Server misconfigured (missing token secret)")
        })?;

        let claims = VerificationClaims::new(uid, self.ttl);
        let token = signer.sign(&claims).map_err(|e| {
            tracing::error!(error = %e, "token signing failed");
            AuthError::internal("Failed to sign token")
        })?;

        tracing::info!(uid = %uid, jti = %claims.jti, exp = claims.exp, "verification token issued");

        Ok(IssuedToken {
            uid: uid.to_string(),
            url: self.verification_url(uid, &token),
            token,
            expires_in: humantime::format_duration(self.ttl).to_string(),
            expires_at: claims.exp,
            jti: claims.jti,
            service: service
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        })
    }

    /// Builds `<base>/verify?uid=<uid>&token=<token>`, relative when no base is set.
    #[must_use]
    pub fn verification_url(&self, uid: &str, token: &str) -> String {
        let path = format!(
            "{VERIFY_PATH}?uid={}&token={}",
            urlencoding::encode(uid),
            urlencoding::encode(token)
        );
        match &self.base_url {
            Some(base) => format!("{base}{path}"),
            None => path,
        }
    }
}

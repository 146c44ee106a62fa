//! HS256 signing primitive for verification tokens.
//!
//! [`TokenSigner`] wraps `jsonwebtoken` with the one symmetric key the
//! process holds. Verification checks the signature and expiry together,
//! with zero leeway, and decodes the payload into the strict
//! [`VerificationClaims`] schema.
//!
//! ## Example
//!
//! ```ignore
//! use verihub_auth::token::{TokenSigner, VerificationClaims};
//!
//! let signer = TokenSigner::from_secret("change-me")?;
//! let token = signer.sign(&VerificationClaims::new("12345", ttl))?;
//! let claims = signer.verify(&token)?;
//! ```

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use time::OffsetDateTime;

use super::claims::VerificationClaims;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while signing or verifying a token.
#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    /// The signing secret is empty or otherwise unusable.
    #[error("Invalid key: {message}")]
    InvalidKey {
        /// Description of why the key is invalid.
        message: String,
    },

    /// Failed to encode a token.
    #[error("Failed to encode token: {message}")]
    EncodingError {
        /// Description of the encoding error.
        message: String,
    },

    /// The token is malformed or its payload does not match the claims schema.
    #[error("Failed to decode token: {message}")]
    DecodingError {
        /// Description of the decoding error.
        message: String,
    },

    /// The token signature is invalid.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The token has expired.
    #[error("Token expired")]
    Expired,
}

impl SignerError {
    /// Creates a new `InvalidKey` error.
    #[must_use]
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }

    /// Creates a new `EncodingError`.
    #[must_use]
    pub fn encoding_error(message: impl Into<String>) -> Self {
        Self::EncodingError {
            message: message.into(),
        }
    }

    /// Creates a new `DecodingError`.
    #[must_use]
    pub fn decoding_error(message: impl Into<String>) -> Self {
        Self::DecodingError {
            message: message.into(),
        }
    }

    /// Returns `true` if the presented token was rejected (as opposed to a signer fault).
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::DecodingError { .. } | Self::InvalidSignature | Self::Expired
        )
    }
}

impl From<jsonwebtoken::errors::Error> for SignerError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            _ => Self::decoding_error(err.to_string()),
        }
    }
}

// ============================================================================
// Token Signer
// ============================================================================

/// Signs and verifies verification tokens with a process-wide symmetric key.
///
/// The signer is immutable after construction and is shared between the
/// issuer and the validator behind an `Arc`.
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenSigner {
    const ALGORITHM: Algorithm = Algorithm::HS256;

    /// Creates a signer from the raw secret.
    ///
    /// # Errors
    /// Returns `SignerError::InvalidKey` if the secret is empty.
    pub fn from_secret(secret: impl AsRef<[u8]>) -> Result<Self, SignerError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(SignerError::invalid_key("signing secret is empty"));
        }

        let mut validation = Validation::new(Self::ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "iat"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        })
    }

    /// Signs the claims into a compact JWT string.
    ///
    /// # Errors
    /// Returns an error if encoding fails.
    pub fn sign(&self, claims: &VerificationClaims) -> Result<String, SignerError> {
        encode(&Header::new(Self::ALGORITHM), claims, &self.encoding_key)
            .map_err(|e| SignerError::encoding_error(e.to_string()))
    }

    /// Verifies the signature and expiry of a token and returns its claims.
    ///
    /// # Errors
    /// Returns an error if the token is malformed, its signature does not
    /// verify, its payload does not match the claims schema, or it has expired.
    pub fn verify(&self, token: &str) -> Result<VerificationClaims, SignerError> {
        let data = decode::<VerificationClaims>(token, &self.decoding_key, &self.validation)?;

        // jsonwebtoken accepts `exp == now`; a token is already dead at its expiry second.
        if data
            .claims
            .is_expired_at(OffsetDateTime::now_utc().unix_timestamp())
        {
            return Err(SignerError::Expired);
        }

        Ok(data.claims)
    }
}

// ============================================================================
// Tests
// ============================================================================

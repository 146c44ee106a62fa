//! Verification error types.
//!
//! This module defines the errors that can be returned by token issuance,
//! token validation and caller authentication. Every variant maps onto one
//! [`ErrorCategory`], which decides the HTTP status surfaced to callers.

use std::fmt;

/// Errors that can occur while issuing or validating verification tokens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The request is missing a required field or is malformed.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of why the request is invalid.
        message: String,
    },

    /// The caller failed the shared-secret check.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Description of why the caller is unauthorized.
        message: String,
    },

    /// The token signature did not verify, the token is malformed, or it has expired.
    ///
    /// These cases are deliberately indistinguishable to the caller.
    #[error("Invalid token: {message}")]
    InvalidToken {
        /// Caller-facing summary.
        message: String,
    },

    /// A correctly signed, unexpired token was presented for a different identity.
    #[error("Identity mismatch: {message}")]
    IdentityMismatch {
        /// Caller-facing summary.
        message: String,
    },

    /// The server is missing a required secret or holds an unusable one.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a new `Unauthorized` error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidToken` error.
    #[must_use]
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken {
            message: message.into(),
        }
    }

    /// Creates a new `IdentityMismatch` error.
    #[must_use]
    pub fn identity_mismatch(message: impl Into<String>) -> Self {
        Self::IdentityMismatch {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns the caller-facing summary carried by this error.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::InvalidRequest { message }
            | Self::Unauthorized { message }
            | Self::InvalidToken { message }
            | Self::IdentityMismatch { message }
            | Self::Configuration { message }
            | Self::Internal { message } => message,
        }
    }

    /// Returns `true` if the caller must correct and resend the request (4xx category).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest { .. }
                | Self::Unauthorized { .. }
                | Self::InvalidToken { .. }
                | Self::IdentityMismatch { .. }
        )
    }

    /// Returns `true` if this is a server error (5xx category).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Configuration { .. } | Self::Internal { .. })
    }

    /// Returns `true` if this is an authentication error (bad caller key or bad token).
    #[must_use]
    pub fn is_authentication_error(&self) -> bool {
        matches!(self, Self::Unauthorized { .. } | Self::InvalidToken { .. })
    }

    /// Returns the error category for logging and response mapping.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidRequest { .. } => ErrorCategory::Client,
            Self::Unauthorized { .. } => ErrorCategory::Authentication,
            Self::InvalidToken { .. } => ErrorCategory::Authentication,
            Self::IdentityMismatch { .. } => ErrorCategory::Mismatch,
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// Categories of verification errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Missing or malformed input.
    Client,
    /// Bad caller key, or bad/expired token.
    Authentication,
    /// Valid token presented for the wrong identity.
    Mismatch,
    /// Missing server secret.
    Configuration,
    /// Unexpected failure.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Client => write!(f, "client"),
            Self::Authentication => write!(f, "authentication"),
            Self::Mismatch => write!(f, "mismatch"),
            Self::Configuration => write!(f, "configuration"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthError::invalid_request("Missing uid");
        assert_eq!(err.to_string(), "Invalid request: Missing uid");

        let err = AuthError::invalid_token("Invalid or expired token");
        assert_eq!(err.to_string(), "Invalid token: Invalid or expired token");

        let err = AuthError::identity_mismatch("Token does not match uid");
        assert_eq!(err.to_string(), "Identity mismatch: Token does not match uid");
    }

    #[test]
    fn test_error_predicates() {
        let err = AuthError::unauthorized("Invalid API key");
        assert!(err.is_client_error());
        assert!(err.is_authentication_error());
        assert!(!err.is_server_error());

        let err = AuthError::identity_mismatch("mismatch");
        assert!(err.is_client_error());
        assert!(!err.is_authentication_error());

        let err = AuthError::configuration("missing secret");
        assert!(!err.is_client_error());
        assert!(err.is_server_error());
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            AuthError::invalid_request("x").category(),
            ErrorCategory::Client
        );
        assert_eq!(
            AuthError::invalid_token("x").category(),
            ErrorCategory::Authentication
        );
        assert_eq!(
            AuthError::identity_mismatch("x").category(),
            ErrorCategory::Mismatch
        );
        assert_eq!(
            AuthError::configuration("x").category(),
            ErrorCategory::Configuration
        );
        assert_eq!(AuthError::internal("x").category(), ErrorCategory::Internal);
    }

    #[test]
    fn test_message_accessor() {
        assert_eq!(AuthError::unauthorized("Invalid API key").message(), "Invalid API key");
    }

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::Authentication.to_string(), "authentication");
        assert_eq!(ErrorCategory::Mismatch.to_string(), "mismatch");
    }
}

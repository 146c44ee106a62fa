//! Axum handlers for verification endpoints.
//!
//! # Available Handlers
//!
//! - [`generate_handler`] - token issuance for trusted callers
//! - [`validate_handler`] / [`verify_handler`] - token validation
//! - [`checkpoint`] - checkpoint session endpoints
//!
//! Request bodies are parsed leniently: the content type is ignored and an
//! empty body reads as `{}`. Every failure is rendered as
//! `{"success": false, "error": "..."}`.

pub mod checkpoint;
pub mod generate;
pub mod validate;

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{FromRef, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::AuthResult;
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::middleware::{CallerKey, failure_response};
use crate::token::{TokenIssuer, TokenValidator, signer_from_config};

pub use checkpoint::{
    CheckpointQuery, SessionResponse, confirm_checkpoint_handler, session_handler,
    start_checkpoint_handler,
};
pub use generate::{GenerateRequest, GenerateResponse, generate_handler};
pub use validate::{ValidateRequest, ValidateResponse, VerifyQuery, validate_handler, verify_handler};

// =============================================================================
// State Types
// =============================================================================

/// State required by the issue and validate endpoints.
#[derive(Clone)]
pub struct VerifyState {
    /// Token issuer.
    pub issuer: Arc<TokenIssuer>,
    /// Token validator.
    pub validator: Arc<TokenValidator>,
    /// Configured caller key for issuance.
    pub caller: CallerKey,
}

impl VerifyState {
    /// Creates a new verify state.
    pub fn new(issuer: Arc<TokenIssuer>, validator: Arc<TokenValidator>, caller: CallerKey) -> Self {
        Self {
            issuer,
            validator,
            caller,
        }
    }

    /// Builds the issuer and validator around one shared signer.
    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Self {
        let signer = signer_from_config(&config.token);
        Self::new(
            Arc::new(TokenIssuer::new(signer.clone(), &config.token)),
            Arc::new(TokenValidator::new(signer)),
            CallerKey::from_config(&config.caller),
        )
    }
}

impl FromRef<VerifyState> for CallerKey {
    fn from_ref(state: &VerifyState) -> Self {
        state.caller.clone()
    }
}

// =============================================================================
// Request Types
// =============================================================================

/// An identity given either as a JSON string or a JSON integer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum IdentityValue {
    /// `"uid": "12345"`
    Text(String),
    /// `"uid": 12345`
    Unsigned(u64),
    /// `"uid": -12345`
    Signed(i64),
}

impl IdentityValue {
    /// Returns the identity as a string.
    #[must_use]
    pub fn into_string(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Unsigned(n) => n.to_string(),
            Self::Signed(n) => n.to_string(),
        }
    }
}

/// JSON body extractor that ignores the content type and reads an empty body as `{}`.
#[derive(Debug, Clone)]
pub struct LenientJson<T>(pub T);

impl<S, T> FromRequest<S> for LenientJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| failure_response(rejection.status(), &rejection.body_text()))?;

        parse_body(&bytes)
            .map(Self)
            .map_err(IntoResponse::into_response)
    }
}

/// Parses a request body, treating an empty or whitespace-only body as `{}`.
///
/// # Errors
/// Returns `InvalidRequest` if the body is not valid JSON for `T`.
pub fn parse_body<T: DeserializeOwned>(bytes: &[u8]) -> AuthResult<T> {
    let body = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"{}".as_slice()
    } else {
        bytes
    };

    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(error = %e, "rejected request body");
        AuthError::invalid_request("Invalid JSON body")
    })
}

/// Fallback for unsupported methods on known routes.
pub async fn method_not_allowed() -> Response {
    failure_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Body {
        uid: Option<IdentityValue>,
    }

    #[test]
    fn test_empty_body_reads_as_empty_object() {
        let body: Body = parse_body(b"").unwrap();
        assert!(body.uid.is_none());

        let body: Body = parse_body(b"  \n").unwrap();
        assert!(body.uid.is_none());
    }

    #[test]
    fn test_numeric_uid_is_stringified() {
        let body: Body = parse_body(br#"{"uid": 987654321098765432}"#).unwrap();
        assert_eq!(body.uid.unwrap().into_string(), "987654321098765432");

        let body: Body = parse_body(br#"{"uid": "12345"}"#).unwrap();
        assert_eq!(body.uid.unwrap().into_string(), "12345");
    }

    #[test]
    fn test_invalid_json_is_client_error() {
        let err = parse_body::<Body>(b"{not json").unwrap_err();
        assert_eq!(err, AuthError::invalid_request("Invalid JSON body"));

        let err = parse_body::<Body>(br#"{"uid": true}"#).unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn test_fractional_uid_is_rejected() {
        for body in [br#"{"uid": 1e3}"#.as_slice(), br#"{"uid": 12.5}"#.as_slice()] {
            let err = parse_body::<Body>(body).unwrap_err();
            assert_eq!(err, AuthError::invalid_request("Invalid JSON body"));
        }

        let body: Body = parse_body(br#"{"uid": -42}"#).unwrap();
        assert_eq!(body.uid.unwrap().into_string(), "-42");
    }

    #[test]
    fn test_verify_state_shares_config() {
        let mut config = AuthConfig::default();
        config.token = crate::config::TokenConfig::with_secret("s");
        let state = VerifyState::from_config(&config);

        let issued = state.issuer.issue("12345", None).unwrap();
        assert!(state.validator.validate("12345", &issued.token).is_ok());
        assert!(!state.caller.is_configured());
    }
}

//! Token issuance endpoint handler.
//!
//! # Request Format
//!
//! ```text
//! POST /generate
//! x-api-key: <caller key>
//! Content-Type: application/json
//!
//! {"uid": "12345", "service": "roles"}
//! ```
//!
//! # Response
//!
//! ```json
//! {
//!   "success": true,
//!   "uid": "12345",
//!   "token": "<jwt>",
//!   "url": "https://verify.example.com/verify?uid=12345&token=<jwt>",
//!   "expiresIn": "7days",
//!   "expiresAt": 1700000000,
//!   "service": "roles"
//! }
//! ```
//!
//! The caller key is checked before the body is read.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::AuthResult;
use crate::error::AuthError;
use crate::middleware::CallerAuth;
use crate::token::IssuedToken;

use super::{IdentityValue, LenientJson, VerifyState};

/// Body of an issuance request.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    /// Identity to bind the token to. Strings and numbers are accepted.
    #[serde(default)]
    pub uid: Option<IdentityValue>,

    /// Optional caller label, echoed back.
    #[serde(default)]
    pub service: Option<String>,
}

/// Successful issuance response.
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub success: bool,
    #[serde(flatten)]
    pub issued: IssuedToken,
}

/// Handles `POST /generate`.
///
/// # Errors
/// - 401 if the caller key is missing or wrong
/// - 400 if `uid` is missing or blank
/// - 500 if the caller key or signing secret is not configured
pub async fn generate_handler(
    State(state): State<VerifyState>,
    _caller: CallerAuth,
    LenientJson(request): LenientJson<GenerateRequest>,
) -> AuthResult<Json<GenerateResponse>> {
    let uid = request
        .uid
        .map(IdentityValue::into_string)
        .ok_or_else(|| AuthError::invalid_request("Missing uid"))?;

    let issued = state.issuer.issue(&uid, request.service.as_deref())?;

    Ok(Json(GenerateResponse {
        success: true,
        issued,
    }))
}

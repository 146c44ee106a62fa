//! Token validation endpoint handlers.
//!
//! `POST /validate` takes `{"uid", "token"}` in the body. `GET /verify`
//! takes the same pair as query parameters, so the link returned at
//! issuance can be resolved directly.

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use serde::{Deserialize, Serialize};

use crate::AuthResult;
use crate::error::AuthError;

use super::{IdentityValue, LenientJson, VerifyState};

/// Body of a validation request.
#[derive(Debug, Default, Deserialize)]
pub struct ValidateRequest {
    #[serde(default)]
    pub uid: Option<IdentityValue>,
    #[serde(default)]
    pub token: Option<String>,
}

/// Query parameters of `GET /verify`.
#[derive(Debug, Default, Deserialize)]
pub struct VerifyQuery {
    pub uid: Option<String>,
    pub token: Option<String>,
}

/// Successful validation response.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ValidateResponse {
    pub success: bool,
    pub uid: String,
}

/// Handles `POST /validate`.
///
/// # Errors
/// - 400 if `uid` or `token` is missing, or the token belongs to another uid
/// - 401 if the token is invalid or expired
/// - 500 if the signing secret is not configured
pub async fn validate_handler(
    State(state): State<VerifyState>,
    LenientJson(request): LenientJson<ValidateRequest>,
) -> AuthResult<Json<ValidateResponse>> {
    let uid = request.uid.map(IdentityValue::into_string);
    validate_pair(&state, uid, request.token)
}

/// Handles `GET /verify?uid=..&token=..`.
///
/// # Errors
/// Same as [`validate_handler`].
pub async fn verify_handler(
    State(state): State<VerifyState>,
    query: Result<Query<VerifyQuery>, QueryRejection>,
) -> AuthResult<Json<ValidateResponse>> {
    let Query(query) = query.map_err(|e| AuthError::invalid_request(e.body_text()))?;
    validate_pair(&state, query.uid, query.token)
}

fn validate_pair(
    state: &VerifyState,
    uid: Option<String>,
    token: Option<String>,
) -> AuthResult<Json<ValidateResponse>> {
    let (Some(uid), Some(token)) = (uid, token) else {
        return Err(AuthError::invalid_request("Missing uid or token"));
    };

    let validated = state.validator.validate(&uid, &token)?;

    Ok(Json(ValidateResponse {
        success: true,
        uid: validated.uid,
    }))
}

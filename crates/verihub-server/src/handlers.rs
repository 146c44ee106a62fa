use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use serde_json::json;
use verihub_auth::http::VerifyState;
use verihub_auth::middleware::failure_response;

#[derive(Serialize)]
pub struct HealthResponse<'a> {
    status: &'a str,
}

#[derive(Serialize)]
pub struct ReadyResponse<'a> {
    status: &'a str,
    token_secret: bool,
    caller_key: bool,
}

pub async fn root() -> impl IntoResponse {
    let body = json!({
        "service": "Verihub",
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(body))
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

/// Ready only once a signing secret is configured; every token call fails otherwise.
pub async fn readyz(State(state): State<VerifyState>) -> impl IntoResponse {
    let token_secret = state.issuer.is_configured();
    let (code, status) = if token_secret {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not_ready")
    };
    (
        code,
        Json(ReadyResponse {
            status,
            token_secret,
            caller_key: state.caller.is_configured(),
        }),
    )
}

pub async fn not_found() -> impl IntoResponse {
    failure_response(StatusCode::NOT_FOUND, "Not found")
}

//! Checkpoint session endpoint handlers.
//!
//! ```text
//! GET  /sessions/{slug}?uid=..&service=..
//! POST /sessions/{slug}/checkpoints/{step}/start
//! POST /sessions/{slug}/checkpoints/{step}/confirm
//! ```
//!
//! `GET` opens the session if it does not exist yet. Each endpoint returns
//! the session view on success.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::checkpoint::{CheckpointError, CheckpointMachine, SessionView};
use crate::middleware::failure_response;

/// Query parameters accepted when a session is opened.
#[derive(Debug, Default, Deserialize)]
pub struct CheckpointQuery {
    pub uid: Option<String>,
    pub service: Option<String>,
}

/// Session response body.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub success: bool,
    #[serde(flatten)]
    pub session: SessionView,
}

impl SessionResponse {
    fn ok(session: SessionView) -> Json<Self> {
        Json(Self {
            success: true,
            session,
        })
    }
}

type StepPath = Result<Path<(String, u8)>, PathRejection>;

/// Unparsable steps (e.g. `/checkpoints/x/start`) are sequence errors.
fn step_path(path: StepPath) -> Result<(String, u8), CheckpointError> {
    path.map(|Path(p)| p)
        .map_err(|_| CheckpointError::InvalidSequence)
}

/// Handles `GET /sessions/{slug}`.
///
/// A malformed query string is rejected with a JSON 400.
pub async fn session_handler(
    State(machine): State<CheckpointMachine>,
    path: Result<Path<String>, PathRejection>,
    query: Result<Query<CheckpointQuery>, QueryRejection>,
) -> Result<Json<SessionResponse>, Response> {
    let Path(slug) = path.map_err(|_| CheckpointError::InvalidSlug.into_response())?;
    let Query(query) = query
        .map_err(|rejection| failure_response(rejection.status(), &rejection.body_text()))?;
    let session = machine
        .open(&slug, query.uid, query.service)
        .await
        .map_err(IntoResponse::into_response)?;
    Ok(SessionResponse::ok(SessionView::from(&session)))
}

/// Handles `POST /sessions/{slug}/checkpoints/{step}/start`.
pub async fn start_checkpoint_handler(
    State(machine): State<CheckpointMachine>,
    path: StepPath,
) -> Result<Json<SessionResponse>, CheckpointError> {
    let (slug, step) = step_path(path)?;
    let session = machine.start(&slug, step).await?;
    Ok(SessionResponse::ok(SessionView::from(&session)))
}

/// Handles `POST /sessions/{slug}/checkpoints/{step}/confirm`.
pub async fn confirm_checkpoint_handler(
    State(machine): State<CheckpointMachine>,
    path: StepPath,
) -> Result<Json<SessionResponse>, CheckpointError> {
    let (slug, step) = step_path(path)?;
    let session = machine.confirm(&slug, step).await?;
    Ok(SessionResponse::ok(SessionView::from(&session)))
}

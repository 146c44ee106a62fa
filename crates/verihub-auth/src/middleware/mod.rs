//! HTTP middleware for verification endpoints.
//!
//! - [`CallerAuth`] - extractor enforcing the shared caller key
//! - `IntoResponse` implementations for [`AuthError`](crate::AuthError) and
//!   [`CheckpointError`](crate::checkpoint::CheckpointError)

pub mod caller;
pub mod error;

pub use caller::{API_KEY_HEADER, CallerAuth, CallerKey, INVALID_API_KEY_MESSAGE};
pub use error::{INTERNAL_ERROR_MESSAGE, failure_response};

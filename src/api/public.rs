//! Public API types

use axum::response::{IntoResponse, Response};
use http::StatusCode;

use crate::ai::chat::ChatError;
use crate::api::state::SessionNotFound;

// Errors

pub struct ApiError(anyhow::Error);

impl ApiError {
    fn status(&self) -> StatusCode {
        if let Some(err) = self.0.downcast_ref::<ChatError>() {
            return match err {
                ChatError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                ChatError::InvalidState(_) => StatusCode::CONFLICT,
                ChatError::Provider(_) => StatusCode::BAD_GATEWAY,
            };
        }
        if self.0.is::<SessionNotFound>() {
            return StatusCode::NOT_FOUND;
        }
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// Convert `ApiError` into an Axum compatible response.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Always log the error
        if status.is_server_error() {
            tracing::error!("{}", self.0);
        } else {
            tracing::warn!("{}", self.0);
        }

        (status, format!("Something went wrong: {}", self.0)).into_response()
    }
}

/// Enables using `?` on functions that return `Result<_,
/// anyhow::Error>` to turn them into `Result<_, ApiError>`
impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

// Re-export public types from each route

pub mod characters {
    pub use crate::api::routes::characters::public::*;
}

pub mod sessions {
    pub use crate::api::routes::sessions::public::*;
}

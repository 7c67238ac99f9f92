use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::StoreError;

/// An HTTP failure with a short, user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: &self.message,
            }),
        )
            .into_response()
    }
}

/// Map store results onto HTTP errors.
///
/// Validation and not-found failures keep their message. Backend failures
/// are logged and replaced by `failure`, so no internals reach the client.
pub trait StoreResultExt<T> {
    fn or_respond(self, failure: &str) -> Result<T, ApiError>;
}

impl<T> StoreResultExt<T> for Result<T, StoreError> {
    fn or_respond(self, failure: &str) -> Result<T, ApiError> {
        self.map_err(|err| match err {
            StoreError::Validation(msg) => ApiError::bad_request(msg),
            StoreError::NotFound(_) => ApiError::not_found("Task not found"),
            other => {
                log::error!("{failure}: {other}");
                ApiError::internal(failure)
            }
        })
    }
}

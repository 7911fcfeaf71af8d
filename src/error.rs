use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use crate::account::{dto::ErrorResponse, services::AccountError};

/// Error returned by handlers. Internal failures are logged here and the
/// client only ever sees a generic message for them.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Account(#[from] AccountError),
    #[error("{0}")]
    BadRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::BadRequest(msg) | AppError::Account(AccountError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            AppError::Account(e @ AccountError::DuplicateEmail) => {
                (StatusCode::CONFLICT, e.to_string())
            }
            AppError::Account(e @ AccountError::InvalidCredentials) => {
                (StatusCode::UNAUTHORIZED, e.to_string())
            }
            AppError::Account(e @ AccountError::NotFound) => (StatusCode::NOT_FOUND, e.to_string()),
            AppError::Account(_) | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

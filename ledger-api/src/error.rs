use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ledger_core::Error;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

/// JSON error envelope: `{"error": "..."}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug)]
pub enum ApiError {
    Core(Error),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Core(err) => match err {
                Error::Decode(_) | Error::Validation(_) => StatusCode::BAD_REQUEST,
                Error::NotFound(_) => StatusCode::NOT_FOUND,
                Error::InsufficientFunds { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                Error::Unauthorized(_) | Error::InvalidToken(_) => StatusCode::UNAUTHORIZED,
                Error::DeadlineExceeded(_) => StatusCode::REQUEST_TIMEOUT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Core(err) => std::fmt::Display::fmt(err, f),
            ApiError::Internal(msg) => f.write_str(msg),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError::Core(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            // Auth failures never reveal why
            ApiError::Core(err) if err.is_auth_failure() => {
                warn!(cause = %err, "unauthorized");
                "Unauthorized".to_string()
            }
            ApiError::Core(err) => {
                if status.is_server_error() {
                    error!(error = %err, "request failed");
                }
                err.to_string()
            }
            ApiError::Internal(msg) => {
                error!(error = %msg, "request failed");
                msg.clone()
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

use crate::github::HookError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Hook rejected or ignored by authentication / classification
    #[error(transparent)]
    Hook(#[from] HookError),

    /// Account directory could not be loaded for this request
    #[error("Failed to load account directory: {0}")]
    Directory(Box<figment::Error>),

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Directory(Box::new(err))
    }
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Hook(hook_err) => hook_err.status_code(),
            Error::Directory(_) | Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            // Hook errors carry no secrets; the sender needs them to debug its setup
            Error::Hook(hook_err) => hook_err.to_string(),
            Error::Directory(_) | Error::Internal { .. } => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self {
            Error::Directory(_) | Error::Internal { .. } => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Hook(hook_err) if hook_err.is_ignored() => {
                tracing::debug!("Ignoring hook: {}", self);
            }
            Error::Hook(HookError::InvalidSignature) => {
                tracing::warn!("Rejected hook: {}", self);
            }
            Error::Hook(_) => {
                tracing::info!("Rejected hook: {}", self);
            }
        }

        let status = self.status_code();
        let body = match &self {
            Error::Hook(hook_err) if hook_err.is_ignored() => json!({ "res": "ignored", "reason": self.user_message() }),
            _ => json!({ "res": "error", "error": self.user_message() }),
        };

        (status, axum::response::Json(body)).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use mingle_db::StoreError;

/// The HTTP error surface. Every failure is reported upward as a structured
/// `{"error": msg}` body; nothing is retried.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Must be authenticated")]
    Unauthenticated,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("recipient cannot be found!")]
    UnknownRecipient,

    #[error("Already sent a request to this user")]
    DuplicateRequest,

    #[error("Sender cannot send message to self!")]
    SelfMessage,

    #[error("Message content cannot be empty!")]
    EmptyContent,

    #[error("{0}")]
    Validation(&'static str),

    #[error("{0} is already taken")]
    Conflict(&'static str),

    #[error("not found")]
    NotFound,

    #[error("internal server error")]
    Internal,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            // 403 for the whole request/message policy family; clients key
            // off these statuses and bodies.
            ApiError::Unauthenticated
            | ApiError::UnknownRecipient
            | ApiError::DuplicateRequest
            | ApiError::SelfMessage
            | ApiError::EmptyContent => StatusCode::FORBIDDEN,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateRequest => ApiError::DuplicateRequest,
            StoreError::UnknownRecipient => ApiError::UnknownRecipient,
            StoreError::NotFound => ApiError::NotFound,
            StoreError::SelfMessage => ApiError::SelfMessage,
            StoreError::EmptyContent => ApiError::EmptyContent,
            StoreError::Conflict(what) => ApiError::Conflict(what),
            StoreError::Sqlite(e) => {
                error!("sqlite error: {}", e);
                ApiError::Internal
            }
            StoreError::Internal(msg) => {
                error!("store error: {}", msg);
                ApiError::Internal
            }
        }
    }
}

/// Join errors from spawn_blocking are always unexpected.
impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        error!("spawn_blocking join error: {}", err);
        ApiError::Internal
    }
}

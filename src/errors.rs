use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::auth::repo::StoreError;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure kinds of the authentication core.
///
/// `Display` is for logs. Clients only ever see [`AuthError::user_message`],
/// which never carries the underlying source.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("identity already registered")]
    DuplicateIdentity,

    /// Unknown identity and wrong password both end up here.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("token expired")]
    TokenExpired,

    #[error("token invalid")]
    TokenInvalid,

    #[error("missing bearer token")]
    MissingToken,

    #[error("credential store unavailable")]
    StoreUnavailable(#[source] BoxError),

    #[error("internal error")]
    Internal(#[source] BoxError),
}

impl AuthError {
    pub fn internal(e: impl Into<BoxError>) -> Self {
        AuthError::Internal(e.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AuthError::DuplicateIdentity => StatusCode::CONFLICT,
            AuthError::InvalidCredentials
            | AuthError::TokenExpired
            | AuthError::TokenInvalid
            | AuthError::MissingToken => StatusCode::UNAUTHORIZED,
            AuthError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            AuthError::InvalidInput(reason) => reason.clone(),
            AuthError::DuplicateIdentity => "Email already registered".into(),
            AuthError::InvalidCredentials => "Invalid credentials".into(),
            AuthError::TokenExpired => "Session expired".into(),
            AuthError::TokenInvalid => "Invalid token".into(),
            AuthError::MissingToken => "Missing bearer token".into(),
            AuthError::StoreUnavailable(_) => "Service temporarily unavailable".into(),
            AuthError::Internal(_) => "Internal server error".into(),
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateIdentity => AuthError::DuplicateIdentity,
            StoreError::Unavailable(source) => AuthError::StoreUnavailable(source.into()),
        }
    }
}

/// Error body returned to clients.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match &self {
            AuthError::StoreUnavailable(source) => {
                error!(error = %source, "credential store unavailable");
            }
            AuthError::Internal(source) => {
                error!(error = %source, "internal auth error");
            }
            _ => {}
        }
        let body = Json(ErrorResponse {
            error: self.user_message(),
        });
        (self.status_code(), body).into_response()
    }
}

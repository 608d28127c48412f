use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::auth::{
    jwt::TokenError,
    repo::{RepoError, UniqueField},
};

/// Everything the auth endpoints can fail with. Each variant maps to one
/// status code and a `{"error": ...}` body.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("{0} already registered")]
    Conflict(UniqueField),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Missing or invalid Authorization header")]
    MissingToken,
    #[error("Invalid or expired token")]
    InvalidToken(#[source] TokenError),
    #[error("User not found")]
    NotFound,
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::Conflict(_) => StatusCode::CONFLICT,
            AuthError::InvalidCredentials
            | AuthError::MissingToken
            | AuthError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            AuthError::NotFound => StatusCode::NOT_FOUND,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Signing(inner) => AuthError::Internal(anyhow::Error::new(inner)),
            other => AuthError::InvalidToken(other),
        }
    }
}

impl From<RepoError> for AuthError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::UniqueViolation(field) => AuthError::Conflict(field),
            RepoError::Database(inner) => {
                AuthError::Internal(anyhow::Error::new(inner).context("user store"))
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::Internal(e) = &self {
            error!(error = ?e, "internal error");
        }
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

//! The authentication error family and its wire representation.
//!
//! Every failure maps to a stable machine-readable code and an HTTP status
//! from a fixed table, so clients can distinguish "retry with refresh"
//! (expired) from "discard session" (invalid / not found) from "wrong
//! password" (bad credentials).

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::jwt::TokenError;

/// Authentication failures. Distinct from the CRUD layer's `ApiError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// Login with an unknown username or wrong password
    BadCredentials,
    /// Token expiry has passed
    ExpiredToken,
    /// Signature mismatch, malformed structure, missing header, or a
    /// blacklisted token
    InvalidToken,
    /// Revocation or reissue target absent (e.g. reissue after logout)
    NotFoundToken,
    /// Backing store failure
    Internal,
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadCredentials | Self::ExpiredToken | Self::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            Self::NotFoundToken => StatusCode::NOT_FOUND,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::BadCredentials => "bad_credentials",
            Self::ExpiredToken => "expired_token",
            Self::InvalidToken => "invalid_token",
            Self::NotFoundToken => "not_found_token",
            Self::Internal => "internal_error",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::BadCredentials => "Wrong username or password",
            Self::ExpiredToken => "Token has expired",
            Self::InvalidToken => "Token is invalid",
            Self::NotFoundToken => "No session for this token",
            Self::Internal => "Internal error",
        }
    }

    /// Log and convert a store failure.
    pub fn db_error(context: &str, e: impl std::fmt::Display) -> Self {
        tracing::error!("{}: {}", context, e);
        Self::Internal
    }
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => Self::ExpiredToken,
            TokenError::Invalid => Self::InvalidToken,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: &'static str,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            Json(ErrorBody {
                code: self.code(),
                message: self.message(),
            }),
        )
            .into_response()
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for AuthError {}

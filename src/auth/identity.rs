//! The authenticated identity threaded through the request pipeline.
//!
//! The filter materializes an [`AuthenticatedMember`] into request
//! extensions; handlers receive it through the [`Auth`] extractor. There is
//! no global security context.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};

use super::error::AuthError;
use crate::db::Role;

/// Required prefix of the Authorization header value.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Identity established by the authentication filter for one request.
#[derive(Debug, Clone)]
pub struct AuthenticatedMember {
    /// Database member ID
    pub member_id: i64,
    /// Username (the token subject)
    pub username: String,
    /// Single authority from the access token
    pub role: Role,
}

/// Read the bearer token from the Authorization header. Absence or a
/// malformed prefix yields None, which verification rejects as invalid.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix(BEARER_PREFIX)?.trim();
    (!token.is_empty()).then_some(token)
}

/// Extractor for handlers behind the authentication filter.
///
/// Rejects with `InvalidToken` when no identity was materialized - that only
/// happens if a protected handler is mounted outside the filter, which the
/// route table is supposed to prevent.
pub struct Auth(pub AuthenticatedMember);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedMember>()
            .cloned()
            .map(Auth)
            .ok_or(AuthError::InvalidToken)
    }
}

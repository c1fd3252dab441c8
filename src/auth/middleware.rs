//! The authentication request filter.
//!
//! Runs once per request, before any handler that reads the identity:
//! consult the route table, extract the bearer token, verify it, check the
//! blacklist, then materialize the identity into request extensions. Any
//! failure short-circuits with the structured error body for its kind -
//! authentication errors never reach a generic handler.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::error::AuthError;
use super::identity::{AuthenticatedMember, bearer_token};
use super::policy::{Access, route_access};
use crate::db::Database;
use crate::jwt::JwtConfig;

/// State shared by the filter across all requests.
#[derive(Clone)]
pub struct AuthState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
}

/// Authentication filter middleware. Apply to the whole router so the route
/// table is the single source of truth for what is public.
pub async fn authenticate(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    if route_access(request.method(), request.uri().path()) == Access::Public {
        return next.run(request).await;
    }

    match verify_request(&state, request.headers()).await {
        Ok(member) => {
            request.extensions_mut().insert(member);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

async fn verify_request(
    state: &AuthState,
    headers: &HeaderMap,
) -> Result<AuthenticatedMember, AuthError> {
    let token = bearer_token(headers).ok_or(AuthError::InvalidToken)?;

    let claims = state.jwt.verify_access(token)?;

    // A structurally valid token may still have been revoked at logout.
    if state
        .db
        .blacklist()
        .is_blocked(token)
        .await
        .map_err(|e| AuthError::db_error("Failed to check blacklist", e))?
    {
        return Err(AuthError::InvalidToken);
    }

    let member = state
        .db
        .members()
        .get_by_username(&claims.sub)
        .await
        .map_err(|e| AuthError::db_error("Failed to get member", e))?
        .ok_or(AuthError::InvalidToken)?;

    Ok(AuthenticatedMember {
        member_id: member.id,
        username: member.username,
        role: claims.auth,
    })
}

//! Token issuance and revocation orchestration.
//!
//! Login produces an access/refresh pair and upserts the member's single
//! session. Reissue exchanges a live refresh token for a fresh access token
//! bound to the owner's current role. Logout deletes the session and
//! blacklists both presented tokens for their residual lifetimes.

use serde::Serialize;
use std::sync::Arc;

use super::error::AuthError;
use crate::db::{Database, Member};
use crate::jwt::JwtConfig;

/// The credential pair returned to the client at login. Never persisted as
/// a unit: only the refresh token is stored server-side.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Orchestrates the codec and the session/blacklist stores.
#[derive(Clone)]
pub struct TokenService {
    db: Database,
    jwt: Arc<JwtConfig>,
}

impl TokenService {
    pub fn new(db: Database, jwt: Arc<JwtConfig>) -> Self {
        Self { db, jwt }
    }

    /// Verify credentials and issue a fresh token pair. The session row is
    /// created or replaced, never duplicated.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, AuthError> {
        let member = self
            .db
            .members()
            .get_by_username(username)
            .await
            .map_err(|e| AuthError::db_error("Failed to get member", e))?
            .ok_or(AuthError::BadCredentials)?;

        let matches = bcrypt::verify(password, &member.password_hash)
            .map_err(|e| AuthError::db_error("Failed to verify password", e))?;
        if !matches {
            return Err(AuthError::BadCredentials);
        }

        self.issue_pair(&member).await
    }

    /// Issue a token pair for an already-authenticated member (e.g. right
    /// after signup).
    pub async fn issue_pair(&self, member: &Member) -> Result<TokenPair, AuthError> {
        let access = self
            .jwt
            .issue_access(&member.username, member.role)
            .map_err(AuthError::from)?;
        let refresh = self
            .jwt
            .issue_refresh(&member.username)
            .map_err(AuthError::from)?;

        self.db
            .sessions()
            .save(member.id, &refresh.token)
            .await
            .map_err(|e| AuthError::db_error("Failed to save session", e))?;

        Ok(TokenPair {
            access_token: access.token,
            refresh_token: refresh.token,
        })
    }

    /// Exchange a live refresh token for a new access token. The new token
    /// is bound to the owner's current role, not whatever the old access
    /// token claimed.
    pub async fn reissue(&self, refresh_token: &str) -> Result<String, AuthError> {
        self.jwt.verify_refresh(refresh_token)?;

        // A structurally valid but unknown token (e.g. post-logout) is
        // rejected here.
        let session = self
            .db
            .sessions()
            .find_by_refresh_token_with_owner(refresh_token)
            .await
            .map_err(|e| AuthError::db_error("Failed to look up session", e))?
            .ok_or(AuthError::NotFoundToken)?;

        if self
            .db
            .blacklist()
            .is_blocked(refresh_token)
            .await
            .map_err(|e| AuthError::db_error("Failed to check blacklist", e))?
        {
            return Err(AuthError::InvalidToken);
        }

        let access = self
            .jwt
            .issue_access(&session.username, session.role)
            .map_err(AuthError::from)?;
        Ok(access.token)
    }

    /// Delete the member's session and blacklist the presented access token
    /// and the stored refresh token for exactly their remaining lifetimes.
    /// The access token is revoked even when no session exists, so the
    /// presented credential is dead either way.
    pub async fn logout(&self, member_id: i64, access_token: &str) -> Result<(), AuthError> {
        if let Some(ttl) = self.jwt.remaining_ttl(access_token) {
            self.db
                .blacklist()
                .add(access_token, ttl)
                .await
                .map_err(|e| AuthError::db_error("Failed to blacklist access token", e))?;
        }

        let session = self
            .db
            .sessions()
            .find_by_member_id(member_id)
            .await
            .map_err(|e| AuthError::db_error("Failed to look up session", e))?
            .ok_or(AuthError::NotFoundToken)?;

        if let Some(ttl) = self.jwt.remaining_ttl(&session.refresh_token) {
            self.db
                .blacklist()
                .add(&session.refresh_token, ttl)
                .await
                .map_err(|e| AuthError::db_error("Failed to blacklist refresh token", e))?;
        }

        let deleted = self
            .db
            .sessions()
            .delete_by_member_id(member_id)
            .await
            .map_err(|e| AuthError::db_error("Failed to delete session", e))?;
        if !deleted {
            return Err(AuthError::NotFoundToken);
        }

        Ok(())
    }
}

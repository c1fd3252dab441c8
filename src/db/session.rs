//! Session and blacklist storage for refresh token tracking and revocation.
//!
//! Only refresh tokens are stored; access tokens stay stateless and are
//! revoked, when necessary, through the blacklist for their residual
//! lifetime.

use sqlx::sqlite::SqlitePool;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::Role;

/// The server-side record binding a member to its current refresh token.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: i64,
    pub member_id: i64,
    pub refresh_token: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A session joined with its owning member, recovered from a bare refresh
/// token in a single lookup.
#[derive(Debug, Clone)]
pub struct SessionWithOwner {
    pub session_id: i64,
    pub refresh_token: String,
    pub member_id: i64,
    pub username: String,
    pub role: Role,
}

/// Store enforcing the one-session-per-member invariant.
pub struct SessionStore {
    pool: SqlitePool,
}

impl SessionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or replace the session for a member. The unique constraint on
    /// member_id turns a concurrent duplicate insert into an update, so two
    /// racing logins can never produce two live sessions.
    pub async fn save(&self, member_id: i64, refresh_token: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO sessions (member_id, refresh_token) VALUES (?, ?)
             ON CONFLICT(member_id) DO UPDATE SET
                 refresh_token = excluded.refresh_token,
                 updated_at = datetime('now')",
        )
        .bind(member_id)
        .bind(refresh_token)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Get the session for a member, if one exists.
    pub async fn find_by_member_id(&self, member_id: i64) -> Result<Option<Session>, sqlx::Error> {
        let row: Option<(i64, i64, String, String, String)> = sqlx::query_as(
            "SELECT id, member_id, refresh_token, created_at, updated_at
             FROM sessions WHERE member_id = ?",
        )
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, member_id, refresh_token, created_at, updated_at)| Session {
            id,
            member_id,
            refresh_token,
            created_at,
            updated_at,
        }))
    }

    /// Recover the owning member from a bare refresh token without a second
    /// lookup. Used at reissue.
    pub async fn find_by_refresh_token_with_owner(
        &self,
        refresh_token: &str,
    ) -> Result<Option<SessionWithOwner>, sqlx::Error> {
        let row: Option<(i64, String, i64, String, String)> = sqlx::query_as(
            "SELECT s.id, s.refresh_token, m.id, m.username, m.role
             FROM sessions s JOIN members m ON m.id = s.member_id
             WHERE s.refresh_token = ?",
        )
        .bind(refresh_token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(
            row.map(|(session_id, refresh_token, member_id, username, role)| SessionWithOwner {
                session_id,
                refresh_token,
                member_id,
                username,
                role: Role::from_str(&role),
            }),
        )
    }

    /// Delete the session for a member. Returns false when no session
    /// existed, so the service layer can surface the absence.
    pub async fn delete_by_member_id(&self, member_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE member_id = ?")
            .bind(member_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete sessions whose refresh token has passed its lifetime.
    pub async fn delete_stale(&self, refresh_ttl: Duration) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM sessions WHERE updated_at < datetime('now', '-' || ? || ' seconds')",
        )
        .bind(refresh_ttl.as_secs() as i64)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

/// TTL-bounded revocation set of token values rejected despite being
/// structurally valid.
pub struct BlacklistStore {
    pool: SqlitePool,
}

impl BlacklistStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Add a token for its remaining lifetime. Replacing an existing entry
    /// keeps the operation idempotent when the same token is revoked twice.
    pub async fn add(&self, token: &str, ttl: Duration) -> Result<(), sqlx::Error> {
        let expires_at = (unix_now() + ttl.as_secs()) as i64;
        sqlx::query(
            "INSERT INTO blacklist (token, expires_at) VALUES (?, ?)
             ON CONFLICT(token) DO UPDATE SET expires_at = excluded.expires_at",
        )
        .bind(token)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Whether a token is currently revoked. Entries at or past their expiry
    /// no longer block; the token they shadowed is dead anyway.
    pub async fn is_blocked(&self, token: &str) -> Result<bool, sqlx::Error> {
        let count: (i32,) =
            sqlx::query_as("SELECT COUNT(*) FROM blacklist WHERE token = ? AND expires_at > ?")
                .bind(token)
                .bind(unix_now() as i64)
                .fetch_one(&self.pool)
                .await?;
        Ok(count.0 > 0)
    }

    /// Delete entries whose shadowed token has expired on its own. SQLite
    /// has no native TTL, so the cleanup scheduler calls this periodically.
    pub async fn delete_expired(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM blacklist WHERE expires_at <= ?")
            .bind(unix_now() as i64)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

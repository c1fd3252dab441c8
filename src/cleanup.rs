//! Scheduled cleanup of expired revocation state.
//!
//! SQLite has no native TTL, so blacklist entries and stale sessions are
//! swept periodically. Every entry shadows a token that has expired on its
//! own by sweep time, so removal never un-revokes anything.

use crate::db::Database;
use std::time::Duration;
use tracing::{error, info};

/// Interval between cleanup runs.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Run all cleanup tasks once.
pub async fn run_cleanup(db: &Database, refresh_ttl: Duration) {
    match db.blacklist().delete_expired().await {
        Ok(count) if count > 0 => info!("Cleaned up {} expired blacklist entries", count),
        Ok(_) => {}
        Err(e) => error!("Failed to clean up blacklist: {}", e),
    }

    match db.sessions().delete_stale(refresh_ttl).await {
        Ok(count) if count > 0 => info!("Cleaned up {} stale sessions", count),
        Ok(_) => {}
        Err(e) => error!("Failed to clean up sessions: {}", e),
    }
}

/// Spawn a background task that runs cleanup periodically.
/// Returns a handle that can be used to abort the task.
pub fn spawn_cleanup_scheduler(db: Database, refresh_ttl: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

        loop {
            interval.tick().await;
            run_cleanup(&db, refresh_ttl).await;
        }
    })
}

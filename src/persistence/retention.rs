//! Retention service for expired progress rows.
//!
//! Reads already filter on `expires_at`, so this sweep is purely a
//! space reclaim. It runs as a background task until cancelled.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::Result;

use super::db::Database;

const PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// Spawn the retention purge background task.
///
/// On each tick it deletes progress records whose `expires_at` has
/// passed.
#[must_use]
pub fn spawn_retention_task(db: Arc<Database>, cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!("retention task shutting down");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(err) = purge_expired(&db).await {
                        error!(%err, "retention purge failed");
                    }
                }
            }
        }
    })
}

/// Delete all progress rows that have expired.
///
/// # Errors
///
/// Returns `AppError::Db` if the delete fails.
pub async fn purge_expired(db: &Database) -> Result<u64> {
    let now = Utc::now().to_rfc3339();
    let result = sqlx::query("DELETE FROM workflow_progress WHERE expires_at <= ?1")
        .bind(&now)
        .execute(db)
        .await?;

    let purged = result.rows_affected();
    if purged > 0 {
        debug!(purged, "expired progress records purged");
    }
    Ok(purged)
}

//! `SQLite`-backed progress store with per-record expiry.
//!
//! Implements the engine's `set`-with-TTL contract on a plain table:
//! each upsert stamps an `expires_at`, and reads filter expired rows, so
//! a record "disappears" at expiry exactly as it would from a TTL'd
//! key-value store. The retention sweep deletes expired rows eventually
//! but is not required for correctness.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::workflow::{ProgressStore, WorkflowProgress};
use crate::{AppError, Result};

use super::db::Database;

/// Progress-record repository over the shared pool.
#[derive(Clone)]
pub struct SqliteProgressStore {
    db: Arc<Database>,
}

/// Internal row struct for `SQLite` deserialization.
#[derive(sqlx::FromRow)]
struct ProgressRow {
    status: String,
    current_step: i64,
    total_steps: i64,
    error: Option<String>,
}

impl ProgressRow {
    fn into_progress(self) -> Result<WorkflowProgress> {
        let current_step = u32::try_from(self.current_step)
            .map_err(|_| AppError::Db(format!("invalid current_step: {}", self.current_step)))?;
        let total_steps = u32::try_from(self.total_steps)
            .map_err(|_| AppError::Db(format!("invalid total_steps: {}", self.total_steps)))?;
        Ok(WorkflowProgress {
            status: self.status,
            current_step,
            total_steps,
            error: self.error,
        })
    }
}

impl SqliteProgressStore {
    /// Create a new store instance.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Read the live (unexpired) record for `key`, if any.
    ///
    /// This is the out-of-band status query path; the engine itself only
    /// ever writes.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn get(&self, key: &str) -> Result<Option<WorkflowProgress>> {
        let now = Utc::now().to_rfc3339();
        let row: Option<ProgressRow> = sqlx::query_as(
            "SELECT status, current_step, total_steps, error
             FROM workflow_progress
             WHERE record_key = ?1 AND expires_at > ?2",
        )
        .bind(key)
        .bind(&now)
        .fetch_optional(self.db.as_ref())
        .await?;

        row.map(ProgressRow::into_progress).transpose()
    }
}

impl ProgressStore for SqliteProgressStore {
    fn set(
        &self,
        key: &str,
        progress: &WorkflowProgress,
        ttl: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let key = key.to_owned();
        let progress = progress.clone();
        Box::pin(async move {
            let ttl = chrono::Duration::from_std(ttl)
                .map_err(|err| AppError::Store(format!("invalid ttl: {err}")))?;
            let expires_at = (Utc::now() + ttl).to_rfc3339();

            sqlx::query(
                "INSERT INTO workflow_progress
                 (record_key, status, current_step, total_steps, error, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(record_key) DO UPDATE SET
                     status = excluded.status,
                     current_step = excluded.current_step,
                     total_steps = excluded.total_steps,
                     error = excluded.error,
                     expires_at = excluded.expires_at",
            )
            .bind(&key)
            .bind(&progress.status)
            .bind(i64::from(progress.current_step))
            .bind(i64::from(progress.total_steps))
            .bind(&progress.error)
            .bind(&expires_at)
            .execute(self.db.as_ref())
            .await
            .map_err(|err| AppError::Store(err.to_string()))?;

            Ok(())
        })
    }
}

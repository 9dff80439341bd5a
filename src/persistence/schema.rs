//! `SQLite` schema bootstrap logic.
//!
//! All table definitions use `CREATE TABLE IF NOT EXISTS` — safe to
//! re-run on every server startup. Produces a convergent result.

use sqlx::SqlitePool;

use crate::Result;

/// Apply all table definitions to the connected `SQLite` database.
///
/// # Errors
///
/// Returns `AppError::Db` if any DDL statement fails.
pub async fn bootstrap_schema(pool: &SqlitePool) -> Result<()> {
    let ddl = r"
CREATE TABLE IF NOT EXISTS workflow_progress (
    record_key      TEXT PRIMARY KEY NOT NULL,
    status          TEXT NOT NULL,
    current_step    INTEGER NOT NULL,
    total_steps     INTEGER NOT NULL,
    error           TEXT,
    expires_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS brand_settings (
    organization_id     TEXT PRIMARY KEY NOT NULL,
    company_name        TEXT NOT NULL,
    company_description TEXT NOT NULL,
    tone_profile        TEXT NOT NULL,
    custom_tone         TEXT,
    audience            TEXT NOT NULL,
    source_url          TEXT NOT NULL,
    updated_at          TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_progress_expires ON workflow_progress(expires_at);
";

    sqlx::raw_sql(ddl).execute(pool).await?;
    Ok(())
}

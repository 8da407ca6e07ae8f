//! Database operations for the `sync_runs` ledger.
//!
//! One row per reconciliation pass started by a trigger. Runs are created in
//! `running` status and move exactly once to `succeeded`, `partial` or `failed`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const RUN_COLUMNS: &str = "id, public_id, trigger_record_id, event_kind, trigger_source, status, \
     items_seen, items_created, items_updated, items_failed, error_message, \
     started_at, completed_at";

/// A row from the `sync_runs` table.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SyncRunRow {
    #[serde(skip)]
    pub id: i64,
    pub public_id: Uuid,
    pub trigger_record_id: i64,
    pub event_kind: String,
    pub trigger_source: String,
    pub status: String,
    pub items_seen: i32,
    pub items_created: i32,
    pub items_updated: i32,
    pub items_failed: i32,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Terminal status of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncRunStatus {
    Succeeded,
    /// Pass completed but at least one item failed.
    Partial,
}

impl SyncRunStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Partial => "partial",
        }
    }
}

/// Item counters recorded when a run finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncRunCounts {
    pub seen: i32,
    pub created: i32,
    pub updated: i32,
    pub failed: i32,
}

/// Creates a run in `running` status and returns the new row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_sync_run(
    pool: &PgPool,
    trigger_record_id: i64,
    event_kind: &str,
    trigger_source: &str,
) -> Result<SyncRunRow, DbError> {
    let sql = format!(
        "INSERT INTO sync_runs (public_id, trigger_record_id, event_kind, trigger_source) \
         VALUES ($1, $2, $3, $4) \
         RETURNING {RUN_COLUMNS}"
    );
    let row = sqlx::query_as::<_, SyncRunRow>(&sql)
        .bind(Uuid::new_v4())
        .bind(trigger_record_id)
        .bind(event_kind)
        .bind(trigger_source)
        .fetch_one(pool)
        .await?;

    Ok(row)
}

/// Marks a running run as finished with the given status and counters.
///
/// # Errors
///
/// Returns [`DbError::InvalidSyncRunTransition`] if the run is not `running`,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn finish_sync_run(
    pool: &PgPool,
    id: i64,
    status: SyncRunStatus,
    counts: SyncRunCounts,
    error_message: Option<&str>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE sync_runs \
         SET status = $1, completed_at = NOW(), items_seen = $2, items_created = $3, \
             items_updated = $4, items_failed = $5, error_message = $6 \
         WHERE id = $7 AND status = 'running'",
    )
    .bind(status.as_str())
    .bind(counts.seen)
    .bind(counts.created)
    .bind(counts.updated)
    .bind(counts.failed)
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidSyncRunTransition {
            id,
            expected_status: "running",
        });
    }
    Ok(())
}

/// Marks a running run as `failed` with an error message.
///
/// # Errors
///
/// Returns [`DbError::InvalidSyncRunTransition`] if the run is not `running`,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn fail_sync_run(pool: &PgPool, id: i64, error_message: &str) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE sync_runs \
         SET status = 'failed', completed_at = NOW(), error_message = $1 \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidSyncRunTransition {
            id,
            expected_status: "running",
        });
    }
    Ok(())
}

/// Fetches a run by its public id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_sync_run(pool: &PgPool, public_id: Uuid) -> Result<Option<SyncRunRow>, DbError> {
    let sql = format!("SELECT {RUN_COLUMNS} FROM sync_runs WHERE public_id = $1");
    let row = sqlx::query_as::<_, SyncRunRow>(&sql)
        .bind(public_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Lists the most recent runs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_sync_runs(pool: &PgPool, limit: i64) -> Result<Vec<SyncRunRow>, DbError> {
    let sql = format!(
        "SELECT {RUN_COLUMNS} FROM sync_runs ORDER BY started_at DESC, id DESC LIMIT $1"
    );
    let rows = sqlx::query_as::<_, SyncRunRow>(&sql)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

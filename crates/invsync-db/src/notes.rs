//! Reconciliation notes: remote products that were created but whose id could
//! not be written back onto the source item.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `reconciliation_notes` table.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ReconciliationNoteRow {
    pub id: i64,
    pub internal_id: i64,
    pub remote_product_id: String,
    pub reason: String,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Records an orphaned remote product for later follow-up.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_reconciliation_note(
    pool: &PgPool,
    internal_id: i64,
    remote_product_id: &str,
    reason: &str,
) -> Result<ReconciliationNoteRow, DbError> {
    let row = sqlx::query_as::<_, ReconciliationNoteRow>(
        "INSERT INTO reconciliation_notes (internal_id, remote_product_id, reason) \
         VALUES ($1, $2, $3) \
         RETURNING id, internal_id, remote_product_id, reason, created_at, resolved_at",
    )
    .bind(internal_id)
    .bind(remote_product_id)
    .bind(reason)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Lists unresolved notes, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_open_reconciliation_notes(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<ReconciliationNoteRow>, DbError> {
    let rows = sqlx::query_as::<_, ReconciliationNoteRow>(
        "SELECT id, internal_id, remote_product_id, reason, created_at, resolved_at \
         FROM reconciliation_notes \
         WHERE resolved_at IS NULL \
         ORDER BY created_at, id \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Counts unresolved notes.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_open_reconciliation_notes(pool: &PgPool) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM reconciliation_notes WHERE resolved_at IS NULL",
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Marks a note as resolved.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the note does not exist or is already
/// resolved, or [`DbError::Sqlx`] if the update fails.
pub async fn resolve_reconciliation_note(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE reconciliation_notes SET resolved_at = NOW() \
         WHERE id = $1 AND resolved_at IS NULL",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

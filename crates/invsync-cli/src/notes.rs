use clap::Subcommand;
use invsync_core::AppConfig;
use invsync_db::{DbError, PgItemStore};

/// Sub-commands available under `notes`.
#[derive(Debug, Subcommand)]
pub enum NotesCommands {
    /// List unresolved reconciliation notes
    List {
        #[arg(long, default_value_t = 50)]
        limit: i64,
    },
    /// Retry the link write-back for unresolved notes and resolve those
    /// that succeed
    Relink {
        #[arg(long, default_value_t = 50)]
        limit: i64,
    },
}

pub(crate) async fn run_notes_command(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    command: NotesCommands,
) -> anyhow::Result<()> {
    match command {
        NotesCommands::List { limit } => list_notes(pool, limit).await,
        NotesCommands::Relink { limit } => relink_notes(pool, config, limit).await,
    }
}

async fn list_notes(pool: &sqlx::PgPool, limit: i64) -> anyhow::Result<()> {
    let notes = invsync_db::list_open_reconciliation_notes(pool, limit.max(1)).await?;
    if notes.is_empty() {
        println!("no open reconciliation notes");
        return Ok(());
    }
    for note in notes {
        println!(
            "#{}  item {} -> product {}  {}  ({})",
            note.id,
            note.internal_id,
            note.remote_product_id,
            note.created_at.format("%Y-%m-%d %H:%M:%S"),
            note.reason,
        );
    }
    Ok(())
}

#[derive(Debug, Default, PartialEq, Eq)]
struct RelinkSummary {
    seen: usize,
    resolved: usize,
    needs_review: usize,
}

async fn relink_notes(pool: &sqlx::PgPool, config: &AppConfig, limit: i64) -> anyhow::Result<()> {
    let store = PgItemStore::new(pool.clone(), config.link_field.clone());
    let summary = relink_open_notes(pool, &store, limit).await?;
    println!(
        "resolved {} of {} notes; {} need manual review",
        summary.resolved, summary.seen, summary.needs_review
    );
    Ok(())
}

/// Writes each noted remote id onto its item. A note is resolved only when
/// the item ends up linked to that id; conflicting links are left for manual
/// review.
async fn relink_open_notes(
    pool: &sqlx::PgPool,
    store: &PgItemStore,
    limit: i64,
) -> Result<RelinkSummary, DbError> {
    let notes = invsync_db::list_open_reconciliation_notes(pool, limit.max(1)).await?;

    let mut summary = RelinkSummary {
        seen: notes.len(),
        ..RelinkSummary::default()
    };
    for note in &notes {
        match store
            .set_external_product_id(note.internal_id, &note.remote_product_id)
            .await
        {
            Ok(()) => {
                invsync_db::resolve_reconciliation_note(pool, note.id).await?;
                tracing::info!(
                    note_id = note.id,
                    internal_id = note.internal_id,
                    remote_id = %note.remote_product_id,
                    "relinked item from reconciliation note"
                );
                summary.resolved += 1;
            }
            Err(e @ (DbError::AlreadyLinked { .. } | DbError::NotFound)) => {
                tracing::warn!(
                    note_id = note.id,
                    internal_id = note.internal_id,
                    error = %e,
                    "reconciliation note needs manual review"
                );
                summary.needs_review += 1;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(summary)
}

#[cfg(test)]
#[path = "notes_test.rs"]
mod tests;

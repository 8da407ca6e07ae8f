//! Wiring of the production reconciler and the sync-run ledger.

use invsync_core::{AppConfig, TriggerEvent};
use invsync_db::{PgItemStore, SyncRunCounts, SyncRunStatus};
use invsync_shopify::{CatalogError, ShopifyAdminClient};
use sqlx::PgPool;
use uuid::Uuid;

use crate::collaborators::{CatalogClient, ItemSource, LinkWriter};
use crate::outcome::{ReconcileReport, TriggerOutcome};
use crate::reconciler::{Reconciler, ReconcilerSettings};

/// Reconciler backed by Postgres and the Shopify Admin API.
pub type PgReconciler = Reconciler<PgItemStore, ShopifyAdminClient, PgItemStore>;

/// Builds the production reconciler from configuration.
///
/// # Errors
///
/// Returns [`CatalogError`] if the Shopify client cannot be constructed.
pub fn build_reconciler(config: &AppConfig, pool: PgPool) -> Result<PgReconciler, CatalogError> {
    let store = PgItemStore::new(pool, config.link_field.clone());
    let catalog = ShopifyAdminClient::from_app_config(config)?;
    Ok(Reconciler::new(
        store.clone(),
        catalog,
        store,
        ReconcilerSettings::from_app_config(config),
    ))
}

/// A trigger outcome together with the ledger row it was recorded under.
#[derive(Debug)]
pub struct RecordedTrigger {
    pub outcome: TriggerOutcome,
    /// `None` for skipped events, or when the ledger row could not be
    /// written.
    pub run_id: Option<Uuid>,
}

/// Handles `event` and records the pass in `sync_runs`.
///
/// Ledger writes are best-effort: a failure to record never stops or fails
/// the pass itself.
pub async fn run_recorded_trigger<S, C, L>(
    pool: &PgPool,
    reconciler: &Reconciler<S, C, L>,
    event: TriggerEvent,
    trigger_source: &str,
) -> RecordedTrigger
where
    S: ItemSource,
    C: CatalogClient,
    L: LinkWriter,
{
    if !event.kind.triggers_sync() {
        return RecordedTrigger {
            outcome: reconciler.handle_trigger(event).await,
            run_id: None,
        };
    }

    let run = match invsync_db::create_sync_run(
        pool,
        event.record_id,
        event.kind.as_str(),
        trigger_source,
    )
    .await
    {
        Ok(run) => Some(run),
        Err(e) => {
            tracing::warn!(
                record_id = event.record_id,
                error = %e,
                "failed to record sync run start"
            );
            None
        }
    };

    let outcome = reconciler.handle_trigger(event).await;

    if let Some(run) = &run {
        finish_run_best_effort(pool, run.id, &outcome).await;
    }

    RecordedTrigger {
        outcome,
        run_id: run.map(|r| r.public_id),
    }
}

async fn finish_run_best_effort(pool: &PgPool, run_id: i64, outcome: &TriggerOutcome) {
    let result = match outcome {
        TriggerOutcome::Completed(report) => {
            let status = if report.is_clean() {
                SyncRunStatus::Succeeded
            } else {
                SyncRunStatus::Partial
            };
            let message = (!report.is_clean()).then(|| report.message());
            invsync_db::finish_sync_run(pool, run_id, status, counts(report), message.as_deref())
                .await
        }
        TriggerOutcome::Aborted(e) => {
            invsync_db::fail_sync_run(pool, run_id, &e.to_string()).await
        }
        TriggerOutcome::Skipped { .. } => return,
    };

    if let Err(e) = result {
        tracing::error!(run_id, error = %e, "failed to record sync run result");
    }
}

fn counts(report: &ReconcileReport) -> SyncRunCounts {
    let clamp = |n: usize| i32::try_from(n).unwrap_or(i32::MAX);
    SyncRunCounts {
        seen: clamp(report.seen()),
        created: clamp(report.created()),
        updated: clamp(report.updated()),
        failed: clamp(report.failed()),
    }
}

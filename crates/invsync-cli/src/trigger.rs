use invsync_core::{AppConfig, EventKind, TriggerEvent};
use invsync_sync::{run_recorded_trigger, TriggerOutcome};

const TRIGGER_SOURCE: &str = "cli";

/// Runs the pass for one record event and prints the outcome.
///
/// # Errors
///
/// Returns an error if the reconciler cannot be built or the pass aborted.
/// Per-item failures are printed but do not fail the command.
pub(crate) async fn run_trigger(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    record_id: i64,
    kind: EventKind,
) -> anyhow::Result<()> {
    let reconciler = invsync_sync::build_reconciler(config, pool.clone())?;
    let event = TriggerEvent { record_id, kind };

    let recorded = run_recorded_trigger(pool, &reconciler, event, TRIGGER_SOURCE).await;

    match &recorded.outcome {
        TriggerOutcome::Skipped { kind } => {
            println!("{kind} events do not trigger a sync");
        }
        TriggerOutcome::Completed(report) => {
            for (internal_id, failure) in report.failures() {
                println!("  item {internal_id}: {failure}");
            }
            println!("{}", report.message());
        }
        TriggerOutcome::Aborted(e) => {
            anyhow::bail!("sync aborted: {e}");
        }
    }

    if let Some(run_id) = recorded.run_id {
        println!("run {run_id}");
    }
    Ok(())
}

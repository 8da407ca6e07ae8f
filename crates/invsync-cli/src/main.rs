mod notes;
mod trigger;

use clap::{Parser, Subcommand};
use invsync_core::EventKind;
use tracing_subscriber::EnvFilter;

use crate::notes::NotesCommands;

#[derive(Debug, Parser)]
#[command(name = "invsync-cli")]
#[command(about = "Inventory to Shopify catalog sync")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fire a record event and run the reconciliation pass it triggers
    Trigger {
        /// Internal id of the record that changed
        #[arg(long)]
        record_id: i64,

        /// Event kind: create, edit, delete, xedit or copy
        #[arg(long)]
        event: EventKind,
    },
    /// Apply pending database migrations
    Migrate,
    /// Show recent sync runs
    Runs {
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Inspect or repair reconciliation notes
    Notes {
        #[command(subcommand)]
        command: NotesCommands,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = invsync_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = invsync_db::PoolConfig::from_app_config(&config);
    let pool = invsync_db::connect_pool(&config.database_url, pool_config).await?;

    match cli.command {
        Commands::Trigger { record_id, event } => {
            trigger::run_trigger(&pool, &config, record_id, event).await
        }
        Commands::Migrate => {
            let applied = invsync_db::run_migrations(&pool).await?;
            println!("migrations up to date ({applied} applied)");
            Ok(())
        }
        Commands::Runs { limit } => list_runs(&pool, limit).await,
        Commands::Notes { command } => notes::run_notes_command(&pool, &config, command).await,
    }
}

async fn list_runs(pool: &sqlx::PgPool, limit: i64) -> anyhow::Result<()> {
    let runs = invsync_db::list_sync_runs(pool, limit.max(1)).await?;
    if runs.is_empty() {
        println!("no sync runs recorded");
        return Ok(());
    }
    for run in runs {
        println!(
            "{}  {:<9}  {} #{} via {}  seen={} created={} updated={} failed={}{}",
            run.started_at.format("%Y-%m-%d %H:%M:%S"),
            run.status,
            run.event_kind,
            run.trigger_record_id,
            run.trigger_source,
            run.items_seen,
            run.items_created,
            run.items_updated,
            run.items_failed,
            run.error_message
                .as_deref()
                .map(|m| format!("  ({m})"))
                .unwrap_or_default(),
        );
    }
    Ok(())
}

//! Migrate command - Schema management for the users, groups and
//! memberships tables.

use crate::cli::args::{MigrateAction, MigrateArgs};
use crate::config::Config;
use crate::errors::AppResult;
use crate::infra::Database;

/// Execute the migrate command
pub async fn execute(args: MigrateArgs, config: Config) -> AppResult<()> {
    // Manual control, so nothing is applied on connect
    let db = Database::connect_without_migrations(&config).await?;

    match args.action {
        MigrateAction::Up => {
            db.run_migrations().await?;
            tracing::info!("Pending migrations applied");
        }
        MigrateAction::Down => {
            db.rollback_migration().await?;
            tracing::info!("Last migration rolled back");
        }
        MigrateAction::Status => {
            let status = db.migration_status().await?;
            for line in format_status(&status) {
                println!("{}", line);
            }
        }
        MigrateAction::Fresh => {
            tracing::warn!("Dropping all tables, memberships included, and re-running migrations");
            db.fresh_migrations().await?;
            tracing::info!("Schema recreated");
        }
    }

    Ok(())
}

fn format_status(status: &[(String, bool)]) -> Vec<String> {
    let width = status.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    status
        .iter()
        .map(|(name, applied)| {
            let state = if *applied { "applied" } else { "pending" };
            format!("{:<width$}  {}", name, state, width = width)
        })
        .collect()
}

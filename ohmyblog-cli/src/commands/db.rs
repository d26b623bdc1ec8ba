//! Database diagnostics

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ohmyblog_core::Settings;
use ohmyblog_server::Lifecycle;

#[derive(Parser, Debug)]
pub struct DbArgs {
    #[command(subcommand)]
    pub command: DbCommands,
}

#[derive(Subcommand, Debug)]
pub enum DbCommands {
    /// Probe the database using the startup retry policy
    Check,
    /// Probe, then create any missing tables and indexes
    Migrate,
}

pub async fn run_db(args: DbArgs, settings: Settings) -> Result<()> {
    let address = settings.database.display_address();
    let lifecycle = Lifecycle::new(settings);

    match args.command {
        DbCommands::Check => {
            let report = lifecycle
                .check_database()
                .await
                .with_context(|| format!("Database {address} is not reachable"))?;
            println!(
                "✓ {address} reachable after {} attempt(s) in {:.2}s",
                report.attempts,
                report.elapsed.as_secs_f64()
            );
        }
        DbCommands::Migrate => {
            lifecycle
                .initialize()
                .await
                .with_context(|| format!("Failed to prepare {address}"))?;
            println!("✓ Schema is up to date on {address}");
            lifecycle.dispose().await;
        }
    }
    Ok(())
}

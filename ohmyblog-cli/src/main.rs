//! ohmyblog CLI - run and operate the blog API server
//!
//! - `serve`: wait for the database, apply the schema and serve HTTP
//! - `db check`: probe the database with the configured retry policy
//! - `config`: show the effective settings or the file they came from
//! - `locales`: list the locale catalog and try out negotiation
//! - `site`: manage site configuration entries

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ohmyblog_core::Settings;

mod commands;
mod config;
mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "ohmyblog",
    author,
    version,
    about = "Blog API server with per-request locale negotiation"
)]
struct Cli {
    /// Config file (default: ./ohmyblog.toml)
    #[arg(long, short = 'c', global = true, env = "OHMYBLOG_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Debug logging with event targets
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Database diagnostics
    Db(commands::db::DbArgs),
    /// Inspect the effective configuration
    Config(config::ConfigArgs),
    /// List locales and preview negotiation
    Locales(commands::locales::LocalesArgs),
    /// Manage site configuration entries (set, list, delete)
    Site(commands::site::SiteArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; the config file and flags still apply
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;
    tracing_setup::init(&tracing_setup::TracingConfig::new(&settings.logging, cli.debug))
        .context("Failed to initialize logging")?;

    match cli.command {
        Commands::Serve(args) => commands::run_serve(args, settings).await?,
        Commands::Db(args) => commands::run_db(args, settings).await?,
        Commands::Config(args) => config::run_config(args, &settings, cli.config.as_deref())?,
        Commands::Locales(args) => commands::run_locales(args, settings)?,
        Commands::Site(args) => commands::run_site(args, settings).await?,
    }
    Ok(())
}

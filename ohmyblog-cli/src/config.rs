use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ohmyblog_core::Settings;

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective settings as TOML (secrets redacted)
    Show,
    /// Show which config file is read
    Path,
    /// Validate settings, including the derived retry policy
    Validate,
}

pub fn run_config(args: ConfigArgs, settings: &Settings, explicit: Option<&Path>) -> Result<()> {
    match args.command {
        ConfigCommands::Show => run_show(settings),
        ConfigCommands::Path => run_path(explicit),
        ConfigCommands::Validate => run_validate(settings),
    }
}

fn run_show(settings: &Settings) -> Result<()> {
    println!("{}", render(settings)?);
    Ok(())
}

fn render(settings: &Settings) -> Result<String> {
    settings
        .redacted()
        .to_toml_string()
        .context("Failed to serialize config to TOML")
}

fn run_path(explicit: Option<&Path>) -> Result<()> {
    match Settings::resolve_path(explicit) {
        (Some(path), _) if path.exists() => println!("{}", path.display()),
        (Some(path), _) => println!("{} (not found, using defaults)", path.display()),
        (None, _) => println!("<defaults>"),
    }
    Ok(())
}

fn run_validate(settings: &Settings) -> Result<()> {
    settings.validate()?;
    let policy = settings.database.retry_policy()?;
    println!("✓ Configuration valid");
    println!(
        "   database: {} (pool max {})",
        settings.database.display_address(),
        settings.database.max_connections()
    );
    println!(
        "   startup probe: {} attempt(s), {:?} per attempt",
        policy.max_attempts(),
        policy.attempt_timeout()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_is_redacted() {
        let mut settings = Settings::default();
        settings.database.password = "hunter2".into();
        let out = render(&settings).unwrap();
        assert!(!out.contains("hunter2"));
        assert!(out.contains("password = \"********\""));
        assert!(out.contains("[database]"));
    }

    #[test]
    fn empty_password_stays_empty() {
        let out = render(&Settings::default()).unwrap();
        assert!(out.contains("password = \"\""));
    }
}

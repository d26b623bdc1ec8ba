//! Site configuration management
//!
//! Entries are typed JSON values stored in `system_config`. Only entries
//! marked public are served by `GET /api/config`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ohmyblog_core::Settings;
use ohmyblog_server::db::repos::{ConfigRepo, NewConfigEntry};
use ohmyblog_server::models::{ConfigKey, ConfigType};
use ohmyblog_server::Lifecycle;
use serde_json::Value;

#[derive(Parser, Debug)]
pub struct SiteArgs {
    #[command(subcommand)]
    pub command: SiteCommands,
}

#[derive(Subcommand, Debug)]
pub enum SiteCommands {
    /// Create or replace an entry
    Set(SetArgs),
    /// List every entry, public or not
    List,
    /// Remove an entry
    Delete {
        /// Entry key (e.g. "site.title")
        key: String,
    },
}

#[derive(Parser, Debug)]
pub struct SetArgs {
    /// Entry key (e.g. "site.title")
    pub key: String,

    /// Value as JSON; bare words are taken as strings
    pub value: String,

    /// Declared value type (string, boolean, number, json, array)
    #[arg(long = "type", default_value = "string")]
    pub config_type: String,

    /// Group used to organise entries
    #[arg(long, default_value = "general")]
    pub group: String,

    /// Human-readable description
    #[arg(long)]
    pub description: Option<String>,

    /// Expose through the public API
    #[arg(long)]
    pub public: bool,
}

impl SetArgs {
    fn entry(self) -> Result<NewConfigEntry> {
        let key = ConfigKey::new(&self.key)?;
        let config_type: ConfigType = self.config_type.parse()?;
        let value = parse_value(&self.value);
        let mut entry = NewConfigEntry::new(key, value, config_type)?
            .group(self.group)
            .public(self.public);
        if let Some(description) = self.description {
            entry = entry.description(description);
        }
        Ok(entry)
    }
}

fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// A validated site command, ready to run against the database
enum Action {
    Set(NewConfigEntry),
    List,
    Delete(ConfigKey),
}

impl TryFrom<SiteCommands> for Action {
    type Error = anyhow::Error;

    fn try_from(command: SiteCommands) -> Result<Self> {
        Ok(match command {
            SiteCommands::Set(args) => Action::Set(args.entry()?),
            SiteCommands::List => Action::List,
            SiteCommands::Delete { key } => Action::Delete(ConfigKey::new(&key)?),
        })
    }
}

pub async fn run_site(args: SiteArgs, settings: Settings) -> Result<()> {
    // Validate input before touching the database
    let action = Action::try_from(args.command)?;

    let lifecycle = Lifecycle::new(settings);
    let db = lifecycle.initialize().await.context("Database is not available")?;
    let repo = ConfigRepo::new(db.pool());

    let result = match action {
        Action::Set(entry) => repo.upsert(entry).await.map(|saved| {
            println!(
                "✓ {} = {} ({}, {})",
                saved.config_key,
                saved.config_value,
                saved.config_type,
                visibility(saved.is_public)
            );
        }),
        Action::List => repo.list_all().await.map(|entries| {
            for e in entries {
                println!(
                    "{:<32} {:<8} {:<10} {:<8} {}",
                    e.config_key,
                    e.config_type,
                    e.config_group,
                    visibility(e.is_public),
                    e.config_value
                );
            }
        }),
        Action::Delete(key) => repo
            .delete(&key)
            .await
            .map(|()| println!("✓ Deleted {}", key.as_str())),
    };

    lifecycle.dispose().await;
    result.context("Site configuration update failed")
}

fn visibility(is_public: bool) -> &'static str {
    if is_public {
        "public"
    } else {
        "private"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_words_are_strings() {
        assert_eq!(parse_value("My Blog"), Value::String("My Blog".into()));
        assert_eq!(parse_value("true"), Value::Bool(true));
        assert_eq!(parse_value("[1, 2]"), serde_json::json!([1, 2]));
    }

    #[test]
    fn set_checks_declared_type() {
        let args = SetArgs {
            key: "comments.enabled".into(),
            value: "yes".into(),
            config_type: "boolean".into(),
            group: "general".into(),
            description: None,
            public: true,
        };
        assert!(args.entry().is_err());
    }

    #[test]
    fn set_rejects_bad_key() {
        let args = SetArgs {
            key: "Site Title".into(),
            value: "x".into(),
            config_type: "string".into(),
            group: "general".into(),
            description: None,
            public: false,
        };
        assert!(args.entry().is_err());
    }
}

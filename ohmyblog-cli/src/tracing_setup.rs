//! Tracing setup for the ohmyblog CLI
//!
//! Usage:
//!   ohmyblog --debug serve               # Debug logging with event targets
//!   RUST_LOG=ohmyblog_server=debug ...   # Fine-grained log control
//!
//! Filter precedence: `RUST_LOG`, then `--debug` / `logging.debug`, then
//! `logging.level` from the config file.

use anyhow::{anyhow, Result};
use ohmyblog_core::LoggingSettings;
use tracing_subscriber::EnvFilter;

/// Tracing configuration options
#[derive(Debug, Clone, Default)]
pub struct TracingConfig {
    /// Force debug level and show targets
    pub debug: bool,
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
}

impl TracingConfig {
    pub fn new(settings: &LoggingSettings, debug_flag: bool) -> Self {
        Self {
            debug: debug_flag || settings.debug,
            level: settings.level.clone(),
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            if self.debug {
                EnvFilter::new("debug")
            } else {
                EnvFilter::try_new(&self.level).unwrap_or_else(|_| EnvFilter::new("info"))
            }
        })
    }
}

/// Install the global console subscriber.
pub fn init(config: &TracingConfig) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(config.filter())
        .with_target(config.debug)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}

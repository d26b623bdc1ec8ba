//! Locale catalog, request locale negotiation and translation.
//!
//! - [`catalog`]: which locales have translation resources on disk
//! - [`negotiate`]: map request hints onto a catalog entry
//! - [`context`]: per-request current locale (task-local)
//! - [`translator`]: lazily loaded Fluent bundles with fallback

pub mod catalog;
pub mod context;
pub mod negotiate;
pub mod translator;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use catalog::LocaleCatalog;
pub use context::{current_locale, sync_with_locale, with_locale};
pub use negotiate::{normalize, parse_accept_language, LocaleHints, LocaleResolver};
pub use translator::{FluentArgs, Translator};

/// Errors raised while reading translation resources
#[derive(Debug, Error)]
pub enum I18nError {
    #[error("failed to scan locale directory {path:?}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

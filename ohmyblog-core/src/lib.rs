pub mod config;
pub mod error;
pub mod i18n;
pub mod retry;

pub use config::{DatabaseSettings, I18nSettings, LoggingSettings, ServerSettings, Settings};
pub use error::ConfigError;
pub use i18n::{LocaleCatalog, LocaleHints, LocaleResolver, Translator};
pub use retry::{retry, AttemptEvent, AttemptFailure, Retried, RetryError, RetryPolicy};

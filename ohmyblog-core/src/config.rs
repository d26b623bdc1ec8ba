//! Service configuration.
//!
//! Settings are layered: built-in defaults, then a TOML file, then
//! `OHMYBLOG__<TABLE>__<FIELD>` environment overrides. Every field has a
//! default, so a missing file still yields a runnable configuration.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};
use crate::retry::RetryPolicy;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "OHMYBLOG_CONFIG";

/// Prefix for per-field environment overrides
pub const OVERRIDE_PREFIX: &str = "OHMYBLOG__";

/// Config file looked up in the working directory when nothing else is given
pub const DEFAULT_CONFIG_FILE: &str = "ohmyblog.toml";

/// Top-level settings document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub i18n: I18nSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Allow any origin. Localhost only when false.
    pub cors_permissive: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_permissive: false,
        }
    }
}

/// Database connection, pool and startup-probe settings.
///
/// Durations are expressed in (fractional) seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub db: String,
    pub pool_size: u32,
    pub max_overflow: u32,
    pub pool_timeout: f64,
    pub pool_recycle: f64,
    pub pool_pre_ping: bool,
    pub echo: bool,
    pub retry_enabled: bool,
    pub retry_max_attempts: u32,
    pub retry_initial_wait: f64,
    pub retry_max_wait: f64,
    pub retry_jitter: f64,
    pub attempt_timeout: f64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: String::new(),
            db: "ohmyblog".to_string(),
            pool_size: 5,
            max_overflow: 10,
            pool_timeout: 30.0,
            pool_recycle: 1800.0,
            pool_pre_ping: true,
            echo: false,
            retry_enabled: true,
            retry_max_attempts: 6,
            retry_initial_wait: 1.0,
            retry_max_wait: 20.0,
            retry_jitter: 1.0,
            attempt_timeout: 10.0,
        }
    }
}

impl DatabaseSettings {
    /// `user@host:port/db`, safe to log.
    pub fn display_address(&self) -> String {
        format!("{}@{}:{}/{}", self.user, self.host, self.port, self.db)
    }

    /// How long to wait for a pooled connection. Must be positive.
    pub fn pool_timeout(&self) -> Result<Duration> {
        let timeout = seconds("database.pool_timeout", self.pool_timeout)?;
        if timeout.is_zero() {
            return Err(ConfigError::invalid(
                "database.pool_timeout",
                "must be greater than zero",
            ));
        }
        Ok(timeout)
    }

    pub fn pool_recycle(&self) -> Result<Duration> {
        seconds("database.pool_recycle", self.pool_recycle)
    }

    /// Upper bound on open connections (`pool_size + max_overflow`).
    pub fn max_connections(&self) -> u32 {
        self.pool_size.saturating_add(self.max_overflow).max(1)
    }

    /// Build the startup probe policy.
    ///
    /// With `retry_enabled = false` this is a single attempt without backoff
    /// that still honours `attempt_timeout`.
    pub fn retry_policy(&self) -> Result<RetryPolicy> {
        let attempt_timeout = seconds("database.attempt_timeout", self.attempt_timeout)?;
        if attempt_timeout.is_zero() {
            return Err(ConfigError::invalid(
                "database.attempt_timeout",
                "must be greater than zero",
            ));
        }

        if !self.retry_enabled {
            return Ok(RetryPolicy::single_attempt(attempt_timeout));
        }

        let jitter = seconds("database.retry_jitter", self.retry_jitter)?;
        let policy = RetryPolicy::new(
            self.retry_max_attempts,
            seconds("database.retry_initial_wait", self.retry_initial_wait)?,
            seconds("database.retry_max_wait", self.retry_max_wait)?,
            attempt_timeout,
        )
        .map_err(|e| ConfigError::invalid("database.retry", e.to_string()))?;

        Ok(policy.with_jitter(jitter))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct I18nSettings {
    /// Locale used when no request hint matches the catalog
    pub default_locale: String,
    /// Resource file stem looked up in each locale directory (`<domain>.ftl`)
    pub domain: String,
    /// Directory holding one sub-directory per locale
    pub locales_dir: PathBuf,
}

impl Default for I18nSettings {
    fn default() -> Self {
        Self {
            default_locale: "zh_CN".to_string(),
            domain: "messages".to_string(),
            locales_dir: PathBuf::from("locales"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// Force debug level and show event targets
    pub debug: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            debug: false,
        }
    }
}

impl Settings {
    /// Load settings from `path`, `$OHMYBLOG_CONFIG`, or `./ohmyblog.toml`,
    /// then apply process environment overrides and validate.
    ///
    /// An explicitly named file must exist; the implicit default may be absent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (resolved, explicit) = Self::resolve_path(path);
        let mut table = match &resolved {
            Some(p) if p.exists() || explicit => read_table(p)?,
            _ => toml::Table::new(),
        };

        apply_overrides(&mut table, env::vars())?;

        let origin = resolved.unwrap_or_else(|| PathBuf::from("<defaults>"));
        let settings: Settings = toml::Value::Table(table)
            .try_into()
            .map_err(|source| ConfigError::Parse {
                path: origin,
                source,
            })?;

        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from a TOML string (no environment overrides).
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Config file that [`Settings::load`] would read, and whether it was
    /// named explicitly.
    pub fn resolve_path(path: Option<&Path>) -> (Option<PathBuf>, bool) {
        if let Some(p) = path {
            return (Some(p.to_path_buf()), true);
        }
        match env::var(CONFIG_ENV) {
            Ok(p) if !p.trim().is_empty() => (Some(PathBuf::from(p)), true),
            _ => (Some(PathBuf::from(DEFAULT_CONFIG_FILE)), false),
        }
    }

    /// Reject values the service cannot start with.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(ConfigError::invalid("server.port", "must be non-zero"));
        }
        if self.i18n.default_locale.trim().is_empty() {
            return Err(ConfigError::invalid(
                "i18n.default_locale",
                "must not be empty",
            ));
        }
        if self.i18n.domain.trim().is_empty() {
            return Err(ConfigError::invalid("i18n.domain", "must not be empty"));
        }
        if self.database.pool_size == 0 {
            return Err(ConfigError::invalid(
                "database.pool_size",
                "must be at least 1",
            ));
        }
        self.database.pool_timeout()?;
        self.database.pool_recycle()?;
        if self.database.retry_max_attempts == 0 {
            return Err(ConfigError::invalid(
                "database.retry_max_attempts",
                "must be at least 1",
            ));
        }
        // Retry knobs are checked even when retry is disabled
        let retrying = DatabaseSettings {
            retry_enabled: true,
            ..self.database.clone()
        };
        retrying.retry_policy()?;
        Ok(())
    }

    /// Copy with secrets masked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.database.password.is_empty() {
            copy.database.password = "********".to_string();
        }
        copy
    }

    /// Render as a TOML document.
    pub fn to_toml_string(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

fn read_table(path: &Path) -> Result<toml::Table> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn seconds(field: &'static str, value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value)
        .map_err(|_| ConfigError::invalid(field, format!("{value} is not a valid duration")))
}

/// Merge `OHMYBLOG__<TABLE>__<FIELD>` variables into `table`.
///
/// The value is typed after the field's default, so `OHMYBLOG__DATABASE__PASSWORD=1234`
/// stays a string while `OHMYBLOG__DATABASE__PORT=5433` becomes an integer.
/// Unknown keys are rejected.
pub fn apply_overrides<I>(table: &mut toml::Table, vars: I) -> Result<()>
where
    I: IntoIterator<Item = (String, String)>,
{
    let defaults = toml::Value::try_from(Settings::default())
        .map_err(|e| ConfigError::override_error(OVERRIDE_PREFIX, e.to_string()))?;

    for (key, raw) in vars {
        let Some(rest) = key.strip_prefix(OVERRIDE_PREFIX) else {
            continue;
        };
        let parts: Vec<String> = rest.split("__").map(|p| p.to_ascii_lowercase()).collect();
        let [section, field] = parts.as_slice() else {
            return Err(ConfigError::override_error(&key, "expected TABLE__FIELD"));
        };

        let template = defaults
            .get(section.as_str())
            .and_then(|s| s.get(field.as_str()))
            .ok_or_else(|| ConfigError::override_error(&key, "unknown setting"))?;
        let value = typed_like(template, &raw)
            .ok_or_else(|| ConfigError::override_error(&key, format!("cannot parse {raw:?}")))?;

        let entry = table
            .entry(section.clone())
            .or_insert_with(|| toml::Value::Table(toml::Table::new()));
        match entry {
            toml::Value::Table(t) => {
                t.insert(field.clone(), value);
            }
            _ => return Err(ConfigError::override_error(&key, "section is not a table")),
        }
    }
    Ok(())
}

fn typed_like(template: &toml::Value, raw: &str) -> Option<toml::Value> {
    let raw = raw.trim();
    match template {
        toml::Value::Boolean(_) => match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(toml::Value::Boolean(true)),
            "false" | "0" | "no" | "off" => Some(toml::Value::Boolean(false)),
            _ => None,
        },
        toml::Value::Integer(_) => raw.parse().ok().map(toml::Value::Integer),
        toml::Value::Float(_) => raw.parse().ok().map(toml::Value::Float),
        _ => Some(toml::Value::String(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_match_documented_values() {
        let s = Settings::default();
        assert_eq!(s.i18n.default_locale, "zh_CN");
        assert!(s.database.retry_enabled);
        assert_eq!(s.database.retry_max_attempts, 6);
        assert_eq!(s.database.retry_initial_wait, 1.0);
        assert_eq!(s.database.retry_max_wait, 20.0);
        assert_eq!(s.database.attempt_timeout, 10.0);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let s = Settings::from_toml_str(
            r#"
            [database]
            host = "db.internal"
            retry_max_attempts = 3

            [i18n]
            default_locale = "en_US"
            "#,
        )
        .unwrap();

        assert_eq!(s.database.host, "db.internal");
        assert_eq!(s.database.retry_max_attempts, 3);
        assert_eq!(s.database.port, 5432);
        assert_eq!(s.i18n.default_locale, "en_US");
        assert_eq!(s.server.port, 8000);
    }

    #[test]
    fn overrides_follow_field_types() {
        let mut table = toml::Table::new();
        apply_overrides(
            &mut table,
            vars(&[
                ("OHMYBLOG__DATABASE__PORT", "5433"),
                ("OHMYBLOG__DATABASE__PASSWORD", "1234"),
                ("OHMYBLOG__DATABASE__RETRY_ENABLED", "false"),
                ("OHMYBLOG__DATABASE__RETRY_MAX_WAIT", "5"),
                ("UNRELATED", "x"),
            ]),
        )
        .unwrap();

        let s: Settings = toml::Value::Table(table).try_into().unwrap();
        assert_eq!(s.database.port, 5433);
        assert_eq!(s.database.password, "1234");
        assert!(!s.database.retry_enabled);
        assert_eq!(s.database.retry_max_wait, 5.0);
    }

    #[test]
    fn override_rejects_unknown_key() {
        let mut table = toml::Table::new();
        let err = apply_overrides(&mut table, vars(&[("OHMYBLOG__DATABASE__NOPE", "1")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Override { .. }));
    }

    #[test]
    fn override_rejects_bad_number() {
        let mut table = toml::Table::new();
        let err = apply_overrides(&mut table, vars(&[("OHMYBLOG__SERVER__PORT", "eighty")]))
            .unwrap_err();
        assert!(err.to_string().contains("eighty"));
    }

    #[test]
    fn validate_rejects_inverted_waits() {
        let mut s = Settings::default();
        s.database.retry_initial_wait = 30.0;
        s.database.retry_max_wait = 5.0;
        assert!(s.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_attempts() {
        let mut s = Settings::default();
        s.database.retry_max_attempts = 0;
        let err = s.validate().unwrap_err();
        assert!(err.to_string().contains("retry_max_attempts"));
    }

    #[test]
    fn validate_rejects_negative_timeout() {
        let mut s = Settings::default();
        s.database.attempt_timeout = -1.0;
        assert!(s.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_pool_timeout() {
        let mut s = Settings::default();
        s.database.pool_timeout = 0.0;
        let err = s.validate().unwrap_err();
        assert!(err.to_string().contains("database.pool_timeout"), "{err}");
        assert!(s.database.pool_timeout().is_err());

        s.database.pool_timeout = 0.5;
        assert_eq!(
            s.database.pool_timeout().unwrap(),
            Duration::from_millis(500)
        );
        assert!(s.validate().is_ok());
    }

    #[test]
    fn disabled_retry_is_single_attempt() {
        let mut db = DatabaseSettings::default();
        db.retry_enabled = false;
        let policy = db.retry_policy().unwrap();
        assert_eq!(policy.max_attempts(), 1);
        assert_eq!(policy.attempt_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn display_address_hides_password() {
        let mut db = DatabaseSettings::default();
        db.password = "hunter2".into();
        let addr = db.display_address();
        assert_eq!(addr, "postgres@localhost:5432/ohmyblog");
        assert!(!addr.contains("hunter2"));
    }

    #[test]
    fn redacted_masks_password() {
        let mut s = Settings::default();
        s.database.password = "hunter2".into();
        let shown = s.redacted().to_toml_string().unwrap();
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains("********"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = Settings::load(Some(&missing)).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn max_connections_adds_overflow() {
        let db = DatabaseSettings::default();
        assert_eq!(db.max_connections(), 15);
    }
}

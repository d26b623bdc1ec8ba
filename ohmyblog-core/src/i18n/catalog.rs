//! Supported locale enumeration.
//!
//! A locale is supported when `<locales_dir>/<locale>/<domain>.ftl` exists.
//! The configured default locale is always a member.

use std::fs;
use std::io;
use std::path::Path;

use super::I18nError;

/// Ordered, immutable set of supported locale identifiers.
///
/// Order matters: primary-subtag fallback picks the first matching entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleCatalog {
    locales: Vec<String>,
    default_locale: String,
}

impl LocaleCatalog {
    /// Build a catalog from an explicit list, keeping its order.
    ///
    /// Duplicates are dropped and `default_locale` is appended when absent.
    pub fn new<I, S>(locales: I, default_locale: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let default_locale = default_locale.into();
        let mut list: Vec<String> = Vec::new();
        for locale in locales {
            let locale = locale.into();
            if !locale.is_empty() && !list.contains(&locale) {
                list.push(locale);
            }
        }
        if !list.contains(&default_locale) {
            list.push(default_locale.clone());
        }

        Self {
            locales: list,
            default_locale,
        }
    }

    /// Scan `dir` for locale sub-directories holding `<domain>.ftl`.
    ///
    /// Entries are taken in lexical order. A missing directory is not an
    /// error; the catalog then holds only the default locale.
    pub fn scan(dir: &Path, domain: &str, default_locale: &str) -> Result<Self, I18nError> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(dir = %dir.display(), "locale directory not found");
                return Ok(Self::new(Vec::<String>::new(), default_locale));
            }
            Err(source) => {
                return Err(I18nError::Scan {
                    path: dir.to_path_buf(),
                    source,
                })
            }
        };

        let resource = format!("{domain}.ftl");
        let mut found = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| I18nError::Scan {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if !path.is_dir() || !path.join(&resource).is_file() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                found.push(name.to_string());
            }
        }
        found.sort();

        tracing::debug!(dir = %dir.display(), locales = ?found, "scanned locale catalog");
        Ok(Self::new(found, default_locale))
    }

    /// Supported locales in catalog order.
    pub fn locales(&self) -> &[String] {
        &self.locales
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    /// Exact (case-sensitive) membership.
    pub fn contains(&self, locale: &str) -> bool {
        self.locales.iter().any(|l| l == locale)
    }

    pub fn len(&self) -> usize {
        self.locales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locales.is_empty()
    }
}

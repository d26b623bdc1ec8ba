//! Fluent-backed message translation.
//!
//! Bundles are loaded on first use and cached per requested locale. Lookup
//! order for a locale is: its own resource, then the default locale's
//! resource, then an empty bundle. A key missing everywhere is returned
//! verbatim.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::FluentResource;
use unic_langid::LanguageIdentifier;

pub use fluent_bundle::FluentArgs;

use super::context::current_locale;
use crate::config::I18nSettings;

type Bundle = FluentBundle<FluentResource>;

/// Loaded resources for one requested locale
struct Loaded {
    /// Locale whose resource was actually loaded, `None` for the empty bundle
    source: Option<String>,
    bundle: Option<Bundle>,
}

pub struct Translator {
    root: PathBuf,
    domain: String,
    default_locale: String,
    cache: RwLock<HashMap<String, Arc<Loaded>>>,
}

impl std::fmt::Debug for Translator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Translator")
            .field("root", &self.root)
            .field("domain", &self.domain)
            .field("default_locale", &self.default_locale)
            .finish_non_exhaustive()
    }
}

impl Translator {
    pub fn new(
        root: impl Into<PathBuf>,
        domain: impl Into<String>,
        default_locale: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            domain: domain.into(),
            default_locale: default_locale.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_settings(settings: &I18nSettings) -> Self {
        Self::new(
            &settings.locales_dir,
            &settings.domain,
            &settings.default_locale,
        )
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    /// Translate `key` in the current request locale (default outside a request).
    pub fn message(&self, key: &str) -> String {
        self.lookup(&self.active_locale(), key, None)
    }

    /// Translate `key` with Fluent arguments in the current request locale.
    pub fn message_with_args(&self, key: &str, args: &FluentArgs<'_>) -> String {
        self.lookup(&self.active_locale(), key, Some(args))
    }

    /// Translate `key` in an explicit locale.
    pub fn message_in(&self, locale: &str, key: &str, args: Option<&FluentArgs<'_>>) -> String {
        self.lookup(locale, key, args)
    }

    /// Locale whose resource actually serves `locale` after fallback.
    pub fn effective_locale(&self, locale: &str) -> Option<String> {
        self.loaded(locale).source.clone()
    }

    fn active_locale(&self) -> String {
        current_locale().unwrap_or_else(|| self.default_locale.clone())
    }

    fn lookup(&self, locale: &str, key: &str, args: Option<&FluentArgs<'_>>) -> String {
        if let Some(text) = format(&self.loaded(locale), key, args) {
            return text;
        }
        // Key missing in a partial translation: try the default resource
        if locale != self.default_locale {
            if let Some(text) = format(&self.loaded(&self.default_locale), key, args) {
                return text;
            }
        }
        key.to_string()
    }

    fn loaded(&self, locale: &str) -> Arc<Loaded> {
        if let Some(hit) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(locale)
        {
            return hit.clone();
        }

        let loaded = Arc::new(self.load_with_fallback(locale));
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(locale.to_string())
            .or_insert(loaded)
            .clone()
    }

    fn load_with_fallback(&self, locale: &str) -> Loaded {
        for candidate in [locale, self.default_locale.as_str()] {
            if let Some(bundle) = load_bundle(&self.root, &self.domain, candidate) {
                return Loaded {
                    source: Some(candidate.to_string()),
                    bundle: Some(bundle),
                };
            }
        }
        tracing::warn!(locale, "no translation resource found, using empty catalog");
        Loaded {
            source: None,
            bundle: None,
        }
    }
}

fn format(loaded: &Loaded, key: &str, args: Option<&FluentArgs<'_>>) -> Option<String> {
    let bundle = loaded.bundle.as_ref()?;
    let pattern = bundle.get_message(key)?.value()?;
    let mut errors = vec![];
    let value = bundle.format_pattern(pattern, args, &mut errors);
    if !errors.is_empty() {
        tracing::debug!(key, ?errors, "fluent formatting reported errors");
    }
    Some(value.into_owned())
}

fn load_bundle(root: &Path, domain: &str, locale: &str) -> Option<Bundle> {
    let path = root.join(locale).join(format!("{domain}.ftl"));
    let source = fs::read_to_string(&path).ok()?;

    let resource = match FluentResource::try_new(source) {
        Ok(resource) => resource,
        Err((partial, errors)) => {
            tracing::warn!(path = %path.display(), ?errors, "translation resource has syntax errors");
            partial
        }
    };

    let langid: LanguageIdentifier = locale
        .replace('_', "-")
        .parse()
        .unwrap_or_default();
    let mut bundle = FluentBundle::new_concurrent(vec![langid]);
    // Plain text output: no Unicode isolation marks around placeables
    bundle.set_use_isolating(false);
    if let Err(errors) = bundle.add_resource(resource) {
        tracing::warn!(path = %path.display(), ?errors, "duplicate messages in translation resource");
    }
    Some(bundle)
}

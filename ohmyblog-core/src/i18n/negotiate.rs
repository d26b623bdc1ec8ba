//! Request locale negotiation.
//!
//! Priority, first non-empty source wins:
//! 1. `lang` query parameter
//! 2. `X-Locale`, then `X-Language` header
//! 3. `Accept-Language`, by descending quality
//! 4. the catalog's default locale
//!
//! Only the first explicit hint (1 or 2) is tried; if it does not match the
//! catalog, negotiation moves straight on to `Accept-Language`.

use std::cmp::Ordering;

use super::LocaleCatalog;

/// Match `candidate` against `supported`.
///
/// `-` and `_` are interchangeable and matching ignores case. An exact match
/// returns the catalog's spelling; otherwise the first entry (in catalog
/// order) sharing the candidate's primary subtag wins, so `zh` picks `zh_CN`
/// when it precedes other `zh_*` entries. Returns `None` when nothing matches.
pub fn normalize<'a, S: AsRef<str>>(candidate: &str, supported: &'a [S]) -> Option<&'a str> {
    let cleaned = candidate.trim().replace('-', "_");
    let lowered = cleaned.to_lowercase();

    if let Some(exact) = supported
        .iter()
        .map(AsRef::as_ref)
        .find(|s| s.to_lowercase() == lowered)
    {
        return Some(exact);
    }

    let base = lowered.split('_').next().unwrap_or_default();
    if base.is_empty() {
        return None;
    }

    supported.iter().map(AsRef::as_ref).find(|s| {
        let s = s.to_lowercase();
        s == base || s.strip_prefix(base).is_some_and(|rest| rest.starts_with('_'))
    })
}

/// Parse an `Accept-Language` value into tags ordered by quality.
///
/// Segments without `;q=` (or with an unparseable or NaN quality) weigh
/// `1.0`. Tags use `_` as separator. Equal qualities keep their original
/// relative order (stable sort).
pub fn parse_accept_language(header: &str) -> Vec<String> {
    let mut weighted: Vec<(String, f64)> = header
        .split(',')
        .filter_map(|segment| {
            let (tag, quality) = match segment.split_once(";q=") {
                Some((tag, q)) => (
                    tag,
                    q.trim().parse::<f64>().ok().filter(|q| !q.is_nan()).unwrap_or(1.0),
                ),
                None => (segment, 1.0),
            };
            let tag = tag.trim().replace('-', "_");
            (!tag.is_empty()).then_some((tag, quality))
        })
        .collect();

    // Vec::sort_by is stable; ties keep header order
    weighted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    weighted.into_iter().map(|(tag, _)| tag).collect()
}

/// Locale hints carried by one request. Empty values count as absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocaleHints<'a> {
    /// `lang` query parameter
    pub query: Option<&'a str>,
    /// `X-Locale` header
    pub x_locale: Option<&'a str>,
    /// `X-Language` header
    pub x_language: Option<&'a str>,
    /// `Accept-Language` header
    pub accept_language: Option<&'a str>,
}

impl<'a> LocaleHints<'a> {
    /// The highest-priority explicit hint, if any.
    ///
    /// Only an empty value is skipped. A whitespace-only value still claims
    /// the slot; it then fails to normalize and resolution moves on to
    /// `Accept-Language`, not to the next header.
    pub fn explicit(&self) -> Option<&'a str> {
        [self.query, self.x_locale, self.x_language]
            .into_iter()
            .flatten()
            .find(|v| !v.is_empty())
    }
}

/// Resolves request hints against an owned [`LocaleCatalog`].
#[derive(Debug, Clone)]
pub struct LocaleResolver {
    catalog: LocaleCatalog,
}

impl LocaleResolver {
    pub fn new(catalog: LocaleCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &LocaleCatalog {
        &self.catalog
    }

    /// Pick exactly one catalog locale for a request. Never fails.
    pub fn resolve(&self, hints: &LocaleHints<'_>) -> &str {
        let supported = self.catalog.locales();

        if let Some(found) = hints.explicit().and_then(|raw| normalize(raw, supported)) {
            return found;
        }

        if let Some(header) = hints.accept_language {
            for candidate in parse_accept_language(header) {
                if let Some(found) = normalize(&candidate, supported) {
                    return found;
                }
            }
        }

        self.catalog.default_locale()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: [&str; 2] = ["zh_CN", "en_US"];

    #[test]
    fn normalize_primary_subtag() {
        assert_eq!(normalize("zh", &CATALOG), Some("zh_CN"));
        assert_eq!(normalize("en", &CATALOG), Some("en_US"));
    }

    #[test]
    fn normalize_ignores_case_and_separator() {
        assert_eq!(normalize("ZH-cn", &["zh_CN"]), Some("zh_CN"));
        assert_eq!(normalize("  en-us ", &CATALOG), Some("en_US"));
    }

    #[test]
    fn normalize_unknown_language() {
        assert_eq!(normalize("fr", &CATALOG), None);
        assert_eq!(normalize("", &CATALOG), None);
        assert_eq!(normalize("_", &CATALOG), None);
    }

    #[test]
    fn normalize_region_falls_back_to_first_variant() {
        let catalog = ["en_US", "zh_TW", "zh_CN"];
        assert_eq!(normalize("zh_HK", &catalog), Some("zh_TW"));
        assert_eq!(normalize("zh_CN", &catalog), Some("zh_CN"));
    }

    #[test]
    fn normalize_does_not_match_on_bare_prefix() {
        // "zh" must not match "zhx_XX": the subtag has to end at the separator
        assert_eq!(normalize("zh", &["zhx_XX"]), None);
        assert_eq!(normalize("zh", &["zh"]), Some("zh"));
    }

    #[test]
    fn accept_language_orders_by_quality() {
        assert_eq!(
            parse_accept_language("zh;q=0.5,en;q=0.9,fr"),
            vec!["fr", "en", "zh"]
        );
    }

    #[test]
    fn accept_language_keeps_ties_in_order() {
        assert_eq!(
            parse_accept_language("de;q=0.8, en-US, fr;q=0.8, zh-CN"),
            vec!["en_US", "zh_CN", "de", "fr"]
        );
    }

    #[test]
    fn accept_language_bad_quality_defaults_to_one() {
        assert_eq!(
            parse_accept_language("en;q=0.2,fr;q=abc,de;q=NaN"),
            vec!["fr", "de", "en"]
        );
    }

    #[test]
    fn accept_language_skips_empty_tags() {
        assert_eq!(parse_accept_language(""), Vec::<String>::new());
        assert_eq!(parse_accept_language(" , ;q=0.5,en"), vec!["en"]);
    }

    fn resolver() -> LocaleResolver {
        LocaleResolver::new(LocaleCatalog::new(CATALOG, "zh_CN"))
    }

    #[test]
    fn query_beats_accept_language() {
        let r = resolver();
        let hints = LocaleHints {
            query: Some("zh_CN"),
            accept_language: Some("en_US"),
            ..Default::default()
        };
        assert_eq!(r.resolve(&hints), "zh_CN");
    }

    #[test]
    fn x_locale_beats_x_language() {
        let r = resolver();
        let hints = LocaleHints {
            x_locale: Some("en"),
            x_language: Some("zh"),
            ..Default::default()
        };
        assert_eq!(r.resolve(&hints), "en_US");
    }

    #[test]
    fn empty_hint_counts_as_absent() {
        let r = resolver();
        let hints = LocaleHints {
            query: Some(""),
            x_language: Some("en-US"),
            ..Default::default()
        };
        assert_eq!(r.resolve(&hints), "en_US");
    }

    #[test]
    fn whitespace_hint_skips_remaining_headers() {
        let r = resolver();
        let hints = LocaleHints {
            query: Some("  "),
            x_language: Some("en-US"),
            ..Default::default()
        };
        assert_eq!(hints.explicit(), Some("  "));
        assert_eq!(r.resolve(&hints), "zh_CN");

        let with_accept = LocaleHints {
            accept_language: Some("en"),
            ..hints
        };
        assert_eq!(r.resolve(&with_accept), "en_US");
    }

    #[test]
    fn unmatched_explicit_hint_falls_through_to_accept_language() {
        let r = resolver();
        let hints = LocaleHints {
            query: Some("fr"),
            x_locale: Some("zh"),
            accept_language: Some("ja;q=0.9,en;q=0.5"),
            ..Default::default()
        };
        // X-Locale is not consulted once the query hint was present
        assert_eq!(r.resolve(&hints), "en_US");
    }

    #[test]
    fn no_hints_yield_default() {
        let r = resolver();
        assert_eq!(r.resolve(&LocaleHints::default()), "zh_CN");
    }

    #[test]
    fn default_absent_from_scan_is_still_resolvable() {
        let r = LocaleResolver::new(LocaleCatalog::new(["en_US"], "ja_JP"));
        assert!(r.catalog().contains("ja_JP"));
        assert_eq!(r.resolve(&LocaleHints::default()), "ja_JP");
        let hints = LocaleHints {
            query: Some("ja"),
            ..Default::default()
        };
        assert_eq!(r.resolve(&hints), "ja_JP");
    }
}

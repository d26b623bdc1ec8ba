//! Locale catalog inspection
//!
//! Lists what the server would offer and, given hints, which locale a
//! request carrying them would be answered in.

use anyhow::{Context, Result};
use clap::Parser;
use ohmyblog_core::{LocaleHints, Settings};
use ohmyblog_server::Lifecycle;

#[derive(Parser, Debug)]
pub struct LocalesArgs {
    /// Simulate a `?lang=` query parameter
    #[arg(long)]
    pub lang: Option<String>,

    /// Simulate an `X-Locale` header
    #[arg(long)]
    pub x_locale: Option<String>,

    /// Simulate an `Accept-Language` header
    #[arg(long)]
    pub accept_language: Option<String>,

    /// Print the greeting in the resolved locale
    #[arg(long)]
    pub greet: bool,
}

pub fn run_locales(args: LocalesArgs, settings: Settings) -> Result<()> {
    let lifecycle = Lifecycle::new(settings);
    let (translator, resolver) = lifecycle.locales().context("Failed to read locale catalog")?;
    let catalog = resolver.catalog();

    for locale in catalog.locales() {
        let marker = if locale == catalog.default_locale() { " (default)" } else { "" };
        println!("{locale}{marker}");
    }

    let hints = LocaleHints {
        query: args.lang.as_deref(),
        x_locale: args.x_locale.as_deref(),
        accept_language: args.accept_language.as_deref(),
        ..Default::default()
    };
    if hints.query.is_none() && hints.x_locale.is_none() && hints.accept_language.is_none() {
        return Ok(());
    }

    let resolved = resolver.resolve(&hints);
    println!("resolved: {resolved}");
    if args.greet {
        println!("{}", translator.message_in(resolved, "greeting", None));
    }
    Ok(())
}

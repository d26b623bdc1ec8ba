//! Process-scoped startup and teardown.
//!
//! A [`Lifecycle`] is built once from [`Settings`] and handed to whoever
//! needs the database. Initialization happens at most once: concurrent
//! callers wait for the first attempt, a failure leaves nothing behind so
//! the caller can abort startup, and [`Lifecycle::dispose`] closes the pool.

use std::sync::Arc;

use ohmyblog_core::i18n::I18nError;
use ohmyblog_core::{ConfigError, LocaleCatalog, LocaleResolver, Settings, Translator};
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::db::{migrations, BootstrapError, BootstrapReport, Bootstrapper, Database, DbError, PgProbe};
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Bootstrap(#[from] BootstrapError<sqlx::Error>),

    #[error("schema migration failed: {0}")]
    Migration(#[source] DbError),

    #[error(transparent)]
    Locales(#[from] I18nError),
}

pub struct Lifecycle {
    settings: Settings,
    database: OnceCell<Database>,
}

impl Lifecycle {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            database: OnceCell::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_initialized(&self) -> bool {
        self.database.initialized()
    }

    /// Connect, wait for the database and apply the schema, once.
    pub async fn initialize(&self) -> Result<&Database, LifecycleError> {
        self.database.get_or_try_init(|| self.start()).await
    }

    /// Probe the configured database without keeping the pool.
    pub async fn check_database(&self) -> Result<BootstrapReport, LifecycleError> {
        let settings = &self.settings.database;
        let db = Database::connect_lazy(settings)?;
        let mut bootstrap = Bootstrapper::new(
            PgProbe::new(db.pool().clone()),
            settings.retry_policy()?,
            settings.display_address(),
        );
        let report = bootstrap.run().await;
        db.close().await;
        Ok(report?)
    }

    /// Translator and locale resolver from the i18n settings.
    pub fn locales(&self) -> Result<(Translator, LocaleResolver), LifecycleError> {
        let i18n = &self.settings.i18n;
        let catalog = LocaleCatalog::scan(&i18n.locales_dir, &i18n.domain, &i18n.default_locale)?;
        tracing::info!(locales = ?catalog.locales(), default = %catalog.default_locale(), "locale catalog loaded");
        Ok((Translator::from_settings(i18n), LocaleResolver::new(catalog)))
    }

    /// Initialize if needed and assemble the handler state.
    pub async fn app_state(&self) -> Result<Arc<AppState>, LifecycleError> {
        let (translator, resolver) = self.locales()?;
        let db = self.initialize().await?.clone();
        Ok(AppState::new(db, translator, resolver))
    }

    async fn start(&self) -> Result<Database, LifecycleError> {
        let settings = &self.settings.database;
        let address = settings.display_address();
        tracing::info!(database = %address, retry = settings.retry_enabled, "initializing database");

        let db = Database::connect_lazy(settings)?;
        let mut bootstrap = Bootstrapper::new(
            PgProbe::new(db.pool().clone()),
            settings.retry_policy()?,
            address.clone(),
        );
        if let Err(err) = bootstrap.run().await {
            db.close().await;
            return Err(err.into());
        }
        if let Err(err) = migrations::run(db.pool()).await {
            db.close().await;
            return Err(LifecycleError::Migration(err));
        }

        tracing::info!(database = %address, "database ready");
        Ok(db)
    }

    /// Close the pool if it was ever opened.
    pub async fn dispose(self) {
        if let Some(db) = self.database.into_inner() {
            db.close().await;
            tracing::info!("database pool closed");
        }
    }
}

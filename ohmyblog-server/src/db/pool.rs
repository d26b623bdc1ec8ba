//! Connection pool construction and error classification

use std::time::Duration;

use ohmyblog_core::{ConfigError, DatabaseSettings};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};

const APPLICATION_NAME: &str = "ohmyblog";

/// Handle to the process-wide connection pool.
///
/// Cloning is cheap; every clone shares the same pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Build the pool without opening any connection.
    ///
    /// Capacity is `pool_size + max_overflow`; idle connections are not kept
    /// warm. The first real connection happens on first acquire, which is
    /// what the bootstrapper exercises.
    pub fn connect_lazy(settings: &DatabaseSettings) -> Result<Self, ConfigError> {
        let recycle = settings.pool_recycle()?;
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections())
            .min_connections(0)
            .acquire_timeout(settings.pool_timeout()?)
            .max_lifetime((!recycle.is_zero()).then_some(recycle))
            .test_before_acquire(settings.pool_pre_ping)
            .connect_lazy_with(connect_options(settings));

        tracing::debug!(
            address = %settings.display_address(),
            max_connections = settings.max_connections(),
            "database pool configured"
        );
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run `SELECT 1`, giving up after `timeout`.
    pub async fn ping(&self, timeout: Duration) -> bool {
        let query = sqlx::query("SELECT 1").execute(&self.pool);
        matches!(tokio::time::timeout(timeout, query).await, Ok(Ok(_)))
    }

    /// Close every connection and refuse new acquires.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}

/// Connection options from settings. Statement logging is on only with `echo`.
pub fn connect_options(settings: &DatabaseSettings) -> PgConnectOptions {
    let mut options = PgConnectOptions::new()
        .host(&settings.host)
        .port(settings.port)
        .username(&settings.user)
        .database(&settings.db)
        .application_name(APPLICATION_NAME);
    if !settings.password.is_empty() {
        options = options.password(&settings.password);
    }
    if settings.echo {
        options
    } else {
        options.disable_statement_logging()
    }
}

/// Whether a failed probe is worth retrying.
///
/// Connectivity problems (I/O, TLS, pool exhaustion, a crashed worker, a
/// garbled protocol exchange) are transient. Server errors are transient
/// only for the SQLSTATE classes matched by [`is_transient_sqlstate`].
/// Everything else, authentication failures included, is fatal.
pub fn is_retryable(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Protocol(_) => true,
        sqlx::Error::Database(db) => db.code().is_some_and(|code| is_transient_sqlstate(&code)),
        _ => false,
    }
}

/// Connection exception (08), insufficient resources (53) and operator
/// intervention such as a server restart in progress (57P0x).
pub fn is_transient_sqlstate(code: &str) -> bool {
    code.starts_with("08") || code.starts_with("53") || code.starts_with("57P0")
}

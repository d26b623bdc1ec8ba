//! Database layer: pool, startup probe, schema and repositories
//!
//! - One lazily connected pool per process, sized from settings
//! - Startup is gated on [`bootstrap::Bootstrapper`] reaching the database
//! - Repositories borrow the pool and rely on DB constraints for conflicts

pub mod bootstrap;
pub mod migrations;
pub mod pool;
pub mod repos;

pub use bootstrap::{BootstrapError, BootstrapReport, BootstrapState, Bootstrapper, PgProbe, Probe};
pub use pool::{is_retryable, Database};
pub use repos::DbError;

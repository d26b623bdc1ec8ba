//! ohmyblog-server: blog HTTP API over PostgreSQL
//!
//! Serves posts, comments, public user profiles and site configuration,
//! answering in the locale negotiated for each request. Startup waits for
//! the database with bounded retries before any route is served.

pub mod db;
pub mod http;
pub mod lifecycle;
pub mod models;
pub mod state;

pub use db::Database;
pub use http::{build_router, run_server, ServerConfig};
pub use lifecycle::{Lifecycle, LifecycleError};
pub use state::AppState;

//! HTTP layer
//!
//! Axum server with:
//! - JSON envelope for every API response
//! - Locale negotiation per request
//! - CORS (localhost only by default), request tracing
//! - Graceful shutdown

pub mod error;
pub mod extractors;
pub mod locale;
pub mod response;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use locale::RequestLocale;
pub use response::{ApiResponse, ErrorCode, ErrorDetail};
pub use server::{build_router, run_server, ServerConfig, ServerError};

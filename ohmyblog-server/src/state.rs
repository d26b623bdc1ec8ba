//! Shared application state

use std::sync::Arc;
use std::time::{Duration, Instant};

use ohmyblog_core::{LocaleResolver, Translator};

use crate::db::Database;
use crate::http::response::{ApiResponse, ErrorCode};

/// State shared by every handler, behind an `Arc`
pub struct AppState {
    pub db: Database,
    pub translator: Translator,
    pub resolver: LocaleResolver,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(db: Database, translator: Translator, resolver: LocaleResolver) -> Arc<Self> {
        Arc::new(Self {
            db,
            translator,
            resolver,
            started_at: Instant::now(),
        })
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Success envelope with the message in the current request locale.
    pub fn success<T>(&self, data: T) -> ApiResponse<T> {
        ApiResponse::success(data, self.translator.message(ErrorCode::Success.message_key()))
    }
}

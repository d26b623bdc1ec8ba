//! Route handlers organized by resource

pub mod comments;
pub mod config;
pub mod health;
pub mod posts;
pub mod root;
pub mod users;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Every route of the public API
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(root::router())
        .merge(health::router())
        .merge(posts::router())
        .merge(comments::router())
        .merge(users::router())
        .merge(config::router())
}

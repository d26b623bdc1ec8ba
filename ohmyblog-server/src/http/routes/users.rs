//! User endpoints (read-only public profiles)

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::db::repos::{User, UserRepo};
use crate::http::error::ApiError;
use crate::http::extractors::ValidUuid;
use crate::http::response::ApiResponse;
use crate::models::UserRole;
use crate::state::AppState;

/// Public view of a user; no email, no credentials
#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            avatar_url: u.avatar_url,
            bio: u.bio,
            role: u.role,
            created_at: u.created_at,
        }
    }
}

/// GET /api/users/{id}
async fn get_user(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<Json<ApiResponse<UserProfile>>, ApiError> {
    let user = UserRepo::new(state.db.pool()).get(id).await?;
    Ok(Json(state.success(user.into())))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/users/{id}", get(get_user))
}

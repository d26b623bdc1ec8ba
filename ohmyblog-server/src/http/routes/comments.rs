//! Comment endpoints

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    http::StatusCode,
    routing::{delete, get, patch},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::repos::{Comment, CommentRepo, NewComment};
use crate::http::error::ApiError;
use crate::http::extractors::ValidUuid;
use crate::http::response::ApiResponse;
use crate::models::{CommentContent, CommentStatus, Paginated, Pagination, PaginationParams};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
    pub parent_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ModerateRequest {
    pub status: String,
    pub moderator_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Option<Uuid>,
    pub parent_id: Option<Uuid>,
    pub content: String,
    pub status: CommentStatus,
    pub like_count: i32,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Comment> for CommentResponse {
    fn from(c: Comment) -> Self {
        Self {
            id: c.id,
            post_id: c.post_id,
            user_id: c.user_id,
            parent_id: c.parent_id,
            content: c.content,
            status: c.status,
            like_count: c.like_count,
            approved_at: c.approved_at,
            created_at: c.created_at,
        }
    }
}

/// GET /api/posts/{post}/comments - approved comments, oldest first
async fn list_comments(
    State(state): State<Arc<AppState>>,
    ValidUuid(post_id): ValidUuid,
    query: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<Json<ApiResponse<Paginated<CommentResponse>>>, ApiError> {
    let Query(params) = query?;
    let comments = CommentRepo::new(state.db.pool())
        .list_approved(post_id, Pagination::from(params))
        .await?;
    Ok(Json(state.success(comments.map(CommentResponse::from))))
}

/// POST /api/posts/{post}/comments - new comments wait for moderation
async fn create_comment(
    State(state): State<Arc<AppState>>,
    ValidUuid(post_id): ValidUuid,
    payload: Result<Json<CreateCommentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<CommentResponse>>), ApiError> {
    let Json(req) = payload?;
    let new = NewComment {
        post_id,
        user_id: req.user_id,
        parent_id: req.parent_id,
        content: CommentContent::new(&req.content)?,
    };
    let comment = CommentRepo::new(state.db.pool()).create(new).await?;
    Ok((StatusCode::CREATED, Json(state.success(comment.into()))))
}

/// PATCH /api/comments/{id}/status
async fn moderate_comment(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
    payload: Result<Json<ModerateRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<CommentResponse>>, ApiError> {
    let Json(req) = payload?;
    let status: CommentStatus = req.status.parse()?;
    let comment = CommentRepo::new(state.db.pool())
        .set_status(id, status, req.moderator_id)
        .await?;
    Ok(Json(state.success(comment.into())))
}

/// DELETE /api/comments/{id}
async fn delete_comment(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<StatusCode, ApiError> {
    CommentRepo::new(state.db.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/posts/{post}/comments",
            get(list_comments).post(create_comment),
        )
        .route("/api/comments/{id}", delete(delete_comment))
        .route("/api/comments/{id}/status", patch(moderate_comment))
}

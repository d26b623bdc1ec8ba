//! Post endpoints

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::repos::{NewPost, Post, PostRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{ValidSlug, ValidUuid};
use crate::http::response::ApiResponse;
use crate::models::{Paginated, Pagination, PostStatus, PostTitle, Slug};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListPostsQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub status: Option<String>,
    pub comment_status: Option<bool>,
    pub is_pinned: Option<bool>,
    pub post_password: Option<String>,
}

impl CreatePostRequest {
    fn validate(self) -> Result<NewPost, ApiError> {
        let status = match self.status.as_deref() {
            Some(s) => s.parse()?,
            None => PostStatus::default(),
        };
        Ok(NewPost {
            title: PostTitle::new(&self.title)?,
            slug: Slug::new(&self.slug)?,
            content: self.content,
            excerpt: self.excerpt,
            cover_image: self.cover_image,
            status,
            comment_status: self.comment_status.unwrap_or(true),
            is_pinned: self.is_pinned.unwrap_or(false),
            post_password: self.post_password.filter(|p| !p.is_empty()),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub status: PostStatus,
    pub comment_status: bool,
    pub is_pinned: bool,
    pub has_password: bool,
    pub view_count: i32,
    pub like_count: i32,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Post> for PostResponse {
    fn from(p: Post) -> Self {
        Self {
            id: p.id,
            title: p.title,
            slug: p.slug,
            content: p.content,
            excerpt: p.excerpt,
            cover_image: p.cover_image,
            status: p.status,
            comment_status: p.comment_status,
            is_pinned: p.is_pinned,
            has_password: p.has_password,
            view_count: p.view_count,
            like_count: p.like_count,
            published_at: p.published_at,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// GET /api/posts - pinned first, newest first, optional `?status=`
async fn list_posts(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListPostsQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Paginated<PostResponse>>>, ApiError> {
    let Query(query) = query?;
    let status = query
        .status
        .as_deref()
        .map(str::parse::<PostStatus>)
        .transpose()?;
    let page = Pagination::new(query.page.unwrap_or(1), query.per_page.unwrap_or(20));

    let posts = PostRepo::new(state.db.pool()).list(page, status).await?;
    Ok(Json(state.success(posts.map(PostResponse::from))))
}

/// POST /api/posts
async fn create_post(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreatePostRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<PostResponse>>), ApiError> {
    let Json(req) = payload?;
    let new = req.validate()?;
    let post = PostRepo::new(state.db.pool()).create(new).await?;
    Ok((StatusCode::CREATED, Json(state.success(post.into()))))
}

/// GET /api/posts/{post} - read by slug, counts a view
async fn get_post(
    State(state): State<Arc<AppState>>,
    ValidSlug(slug): ValidSlug,
) -> Result<Json<ApiResponse<PostResponse>>, ApiError> {
    let post = PostRepo::new(state.db.pool()).get_by_slug(&slug).await?;
    Ok(Json(state.success(post.into())))
}

/// PATCH /api/posts/{post}/status
async fn update_post_status(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<PostResponse>>, ApiError> {
    let Json(req) = payload?;
    let status: PostStatus = req.status.parse()?;
    let post = PostRepo::new(state.db.pool()).update_status(id, status).await?;
    Ok(Json(state.success(post.into())))
}

/// DELETE /api/posts/{post} - by id
async fn delete_post(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<StatusCode, ApiError> {
    PostRepo::new(state.db.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Post routes. `{post}` is a slug for reads and an id otherwise.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/posts", get(list_posts).post(create_post))
        .route("/api/posts/{post}", get(get_post).delete(delete_post))
        .route("/api/posts/{post}/status", patch(update_post_status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ValidationError;

    fn request() -> CreatePostRequest {
        CreatePostRequest {
            title: "Hello".into(),
            slug: "hello".into(),
            content: "body".into(),
            excerpt: None,
            cover_image: None,
            status: None,
            comment_status: None,
            is_pinned: None,
            post_password: Some(String::new()),
        }
    }

    #[test]
    fn create_defaults() {
        let new = request().validate().unwrap();
        assert_eq!(new.status, PostStatus::Draft);
        assert!(new.comment_status);
        assert!(!new.is_pinned);
        assert_eq!(new.post_password, None);
    }

    #[test]
    fn create_rejects_unknown_status() {
        let req = CreatePostRequest {
            status: Some("live".into()),
            ..request()
        };
        match req.validate() {
            Err(ApiError::Validation(ValidationError::InvalidVariant { field, value })) => {
                assert_eq!(field, "status");
                assert_eq!(value, "live");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn create_rejects_bad_slug() {
        let req = CreatePostRequest {
            slug: "Hello World".into(),
            ..request()
        };
        assert!(matches!(
            req.validate(),
            Err(ApiError::Validation(ValidationError::InvalidFormat { field: "slug", .. }))
        ));
    }
}

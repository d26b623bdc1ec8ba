//! Post repository

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{paginate, DbError};
use crate::models::{Paginated, Pagination, PostStatus, PostTitle, Slug};

const COLUMNS: &str = "id, title, slug, content, excerpt, cover_image, status, comment_status, \
                       is_pinned, post_password IS NOT NULL AS has_password, view_count, \
                       like_count, published_at, created_at, updated_at";

/// Post record. The access password itself is never selected.
#[derive(Debug, Clone, FromRow)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    #[sqlx(try_from = "String")]
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

#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: PostTitle,
    pub slug: Slug,
    pub content: String,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub status: PostStatus,
    pub comment_status: bool,
    pub is_pinned: bool,
    pub post_password: Option<String>,
}

pub struct PostRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> PostRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a post; `published_at` is set when it is created published.
    pub async fn create(&self, new: NewPost) -> Result<Post, DbError> {
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            INSERT INTO posts (
                title, slug, content, excerpt, cover_image, status,
                comment_status, is_pinned, post_password, published_at
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9,
                CASE WHEN $6 = 'published' THEN NOW() END
            )
            RETURNING {COLUMNS}
            "#
        ))
        .bind(new.title.as_str())
        .bind(new.slug.as_str())
        .bind(&new.content)
        .bind(new.excerpt.as_deref())
        .bind(new.cover_image.as_deref())
        .bind(new.status.as_str())
        .bind(new.comment_status)
        .bind(new.is_pinned)
        .bind(new.post_password.as_deref())
        .fetch_one(self.pool)
        .await?;

        tracing::info!(post_id = %post.id, slug = %post.slug, status = %post.status, "post created");
        Ok(post)
    }

    pub async fn get(&self, id: Uuid) -> Result<Post, DbError> {
        sqlx::query_as::<_, Post>(&format!("SELECT {COLUMNS} FROM posts WHERE id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("post", id))
    }

    /// Fetch a post for reading; counts as one view.
    pub async fn get_by_slug(&self, slug: &Slug) -> Result<Post, DbError> {
        sqlx::query_as::<_, Post>(&format!(
            r#"
            UPDATE posts
            SET view_count = view_count + 1
            WHERE slug = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(slug.as_str())
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("post", slug.as_str()))
    }

    /// Pinned posts first, then newest first.
    pub async fn list(
        &self,
        page: Pagination,
        status: Option<PostStatus>,
    ) -> Result<Paginated<Post>, DbError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {COLUMNS}, COUNT(*) OVER() AS total
            FROM posts
            WHERE $1::text IS NULL OR status = $1
            ORDER BY is_pinned DESC, created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(status.map(|s| s.as_str()))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        paginate(rows, page)
    }

    /// Move a post to `status`. The first transition to published stamps
    /// `published_at`; later ones keep the original date.
    pub async fn update_status(&self, id: Uuid, status: PostStatus) -> Result<Post, DbError> {
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            UPDATE posts
            SET status = $2,
                published_at = CASE
                    WHEN $2 = 'published' THEN COALESCE(published_at, NOW())
                    ELSE published_at
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("post", id))?;

        tracing::info!(post_id = %id, status = %post.status, "post status changed");
        Ok(post)
    }

    /// Delete a post and, by cascade, its comments.
    pub async fn delete(&self, id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("post", id));
        }
        tracing::info!(post_id = %id, "post deleted");
        Ok(())
    }
}

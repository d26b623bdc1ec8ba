//! Comment repository

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{paginate, DbError};
use crate::models::{CommentContent, CommentStatus, Paginated, Pagination};

const COLUMNS: &str = "id, post_id, user_id, parent_id, content, status, like_count, \
                       approved_at, approved_by, created_at, updated_at";

#[derive(Debug, Clone, FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Option<Uuid>,
    pub parent_id: Option<Uuid>,
    pub content: String,
    #[sqlx(try_from = "String")]
    pub status: CommentStatus,
    pub like_count: i32,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: Uuid,
    pub user_id: Option<Uuid>,
    pub parent_id: Option<Uuid>,
    pub content: CommentContent,
}

pub struct CommentRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> CommentRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Add a pending comment.
    ///
    /// The post must exist and accept comments, and a reply must point at
    /// a comment on the same post. Checks and insert share one transaction.
    pub async fn create(&self, new: NewComment) -> Result<Comment, DbError> {
        let mut tx = self.pool.begin().await?;

        let open: Option<(bool,)> =
            sqlx::query_as("SELECT comment_status FROM posts WHERE id = $1 FOR SHARE")
                .bind(new.post_id)
                .fetch_optional(&mut *tx)
                .await?;
        match open {
            None => return Err(DbError::not_found("post", new.post_id)),
            Some((false,)) => return Err(DbError::CommentsClosed { post_id: new.post_id }),
            Some((true,)) => {}
        }

        if let Some(parent_id) = new.parent_id {
            let parent: Option<(Uuid,)> =
                sqlx::query_as("SELECT post_id FROM comments WHERE id = $1")
                    .bind(parent_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            match parent {
                None => return Err(DbError::not_found("comment", parent_id)),
                Some((post_id,)) if post_id != new.post_id => {
                    return Err(DbError::Constraint {
                        detail: format!("parent comment '{parent_id}' belongs to another post"),
                    })
                }
                Some(_) => {}
            }
        }

        let comment = sqlx::query_as::<_, Comment>(&format!(
            r#"
            INSERT INTO comments (post_id, user_id, parent_id, content)
            VALUES ($1, $2, $3, $4)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(new.post_id)
        .bind(new.user_id)
        .bind(new.parent_id)
        .bind(new.content.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(comment_id = %comment.id, post_id = %comment.post_id, "comment created");
        Ok(comment)
    }

    /// Approved comments of a post, oldest first.
    pub async fn list_approved(
        &self,
        post_id: Uuid,
        page: Pagination,
    ) -> Result<Paginated<Comment>, DbError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {COLUMNS}, COUNT(*) OVER() AS total
            FROM comments
            WHERE post_id = $1 AND status = 'approved'
            ORDER BY created_at ASC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(post_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        paginate(rows, page)
    }

    /// Moderate a comment. Approval stamps `approved_at`/`approved_by`,
    /// any other status clears them.
    pub async fn set_status(
        &self,
        id: Uuid,
        status: CommentStatus,
        moderator: Option<Uuid>,
    ) -> Result<Comment, DbError> {
        let comment = sqlx::query_as::<_, Comment>(&format!(
            r#"
            UPDATE comments
            SET status = $2,
                approved_at = CASE WHEN $2 = 'approved' THEN NOW() END,
                approved_by = CASE WHEN $2 = 'approved' THEN $3 END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status.as_str())
        .bind(moderator)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("comment", id))?;

        tracing::info!(comment_id = %id, status = %comment.status, "comment moderated");
        Ok(comment)
    }

    /// Delete a comment and its replies.
    pub async fn delete(&self, id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("comment", id));
        }
        Ok(())
    }
}

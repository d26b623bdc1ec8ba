//! Repositories, one per table
//!
//! - Each repository borrows the pool for the duration of a call
//! - Uniqueness and foreign keys are enforced by the database, violations
//!   surface as [`DbError::Conflict`] / [`DbError::Constraint`]
//! - List queries return the total with `COUNT(*) OVER()` in one round trip

pub mod comments;
pub mod posts;
pub mod system_config;
pub mod users;

use sqlx::error::ErrorKind;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Paginated, Pagination};

pub use comments::{Comment, CommentRepo, NewComment};
pub use posts::{NewPost, Post, PostRepo};
pub use system_config::{ConfigEntry, ConfigRepo, NewConfigEntry};
pub use users::{NewUser, User, UserRepo};

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[source] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    /// Unique violation (SQLSTATE 23505)
    #[error("{resource} already exists ({detail})")]
    Conflict { resource: String, detail: String },

    /// Check, foreign key or not-null violation
    #[error("constraint violated: {detail}")]
    Constraint { detail: String },

    #[error("comments are closed for post '{post_id}'")]
    CommentsClosed { post_id: Uuid },
}

impl DbError {
    pub(crate) fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        let sqlx::Error::Database(db) = &err else {
            return Self::Sqlx(err);
        };
        let detail = db
            .constraint()
            .map(str::to_owned)
            .unwrap_or_else(|| db.message().to_owned());
        match db.kind() {
            ErrorKind::UniqueViolation => Self::Conflict {
                resource: db.table().unwrap_or("record").to_owned(),
                detail,
            },
            ErrorKind::ForeignKeyViolation
            | ErrorKind::CheckViolation
            | ErrorKind::NotNullViolation => Self::Constraint { detail },
            _ => Self::Sqlx(err),
        }
    }
}

/// Decode rows carrying a `total` window column into one page.
pub(crate) fn paginate<T>(rows: Vec<PgRow>, page: Pagination) -> Result<Paginated<T>, DbError>
where
    T: for<'r> FromRow<'r, PgRow>,
{
    let total = match rows.first() {
        Some(row) => row.try_get::<i64, _>("total")?,
        None => 0,
    };
    let items = rows
        .iter()
        .map(T::from_row)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(page.wrap(items, total))
}

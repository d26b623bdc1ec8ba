//! User repository
//!
//! Passwords arrive already hashed; the hash is written but never read back.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{paginate, DbError};
use crate::models::{Email, Paginated, Pagination, UserRole, UserStatus, Username};

const COLUMNS: &str = "id, username, email, avatar_url, bio, role, status, \
                       last_login_at, email_verified, created_at, updated_at";

/// User record, without the password hash
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    #[sqlx(try_from = "String")]
    pub role: UserRole,
    #[sqlx(try_from = "String")]
    pub status: UserStatus,
    pub last_login_at: Option<DateTime<Utc>>,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: Username,
    pub email: Email,
    pub password_hash: String,
    pub role: UserRole,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
}

pub struct UserRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a user. A taken username or email is a [`DbError::Conflict`].
    pub async fn create(&self, new: NewUser) -> Result<User, DbError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash, role, avatar_url, bio)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(new.username.as_str())
        .bind(new.email.as_str())
        .bind(&new.password_hash)
        .bind(new.role.as_str())
        .bind(new.avatar_url.as_deref())
        .bind(new.bio.as_deref())
        .fetch_one(self.pool)
        .await?;

        tracing::info!(user_id = %user.id, username = %user.username, "user created");
        Ok(user)
    }

    pub async fn get(&self, id: Uuid) -> Result<User, DbError> {
        sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("user", id))
    }

    pub async fn get_by_username(&self, username: &Username) -> Result<User, DbError> {
        sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE username = $1"))
            .bind(username.as_str())
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("user", username.as_str()))
    }

    /// Newest accounts first.
    pub async fn list(&self, page: Pagination) -> Result<Paginated<User>, DbError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {COLUMNS}, COUNT(*) OVER() AS total
            FROM users
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        paginate(rows, page)
    }

    /// Stamp `last_login_at` with the current time.
    pub async fn record_login(&self, id: Uuid) -> Result<User, DbError> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET last_login_at = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("user", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations;

    async fn pool() -> PgPool {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = PgPool::connect(&url).await.expect("connect failed");
        migrations::run(&pool).await.expect("migrations failed");
        pool
    }

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: Username::new(name).unwrap(),
            email: Email::new(&format!("{name}@example.com")).unwrap(),
            password_hash: "$argon2id$placeholder".into(),
            role: UserRole::default(),
            avatar_url: None,
            bio: None,
        }
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn create_then_lookup() {
        let pool = pool().await;
        let repo = UserRepo::new(&pool);
        let name = format!("u{}", &Uuid::new_v4().simple().to_string()[..12]);

        let created = repo.create(new_user(&name)).await.unwrap();
        assert_eq!(created.role, UserRole::User);
        assert_eq!(created.status, UserStatus::Active);
        assert!(created.last_login_at.is_none());

        let by_name = repo.get_by_username(&Username::new(&name).unwrap()).await.unwrap();
        assert_eq!(by_name.id, created.id);

        let logged_in = repo.record_login(created.id).await.unwrap();
        assert!(logged_in.last_login_at.is_some());
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn duplicate_username_conflicts() {
        let pool = pool().await;
        let repo = UserRepo::new(&pool);
        let name = format!("u{}", &Uuid::new_v4().simple().to_string()[..12]);

        repo.create(new_user(&name)).await.unwrap();
        let err = repo.create(new_user(&name)).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn missing_user_is_not_found() {
        let pool = pool().await;
        let err = UserRepo::new(&pool).get(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { resource: "user", .. }));
    }
}

//! Idempotent schema setup for the blog tables

use sqlx::PgPool;

use super::DbError;

const TABLES: &[(&str, &str)] = &[
    (
        "users",
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            username VARCHAR(50) NOT NULL UNIQUE,
            email VARCHAR(100) NOT NULL UNIQUE,
            password_hash VARCHAR(255) NOT NULL,
            avatar_url VARCHAR(500),
            bio TEXT,
            role VARCHAR(20) NOT NULL DEFAULT 'user',
            status VARCHAR(20) NOT NULL DEFAULT 'active',
            last_login_at TIMESTAMPTZ,
            email_verified BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CONSTRAINT users_role_check CHECK (role IN ('admin', 'editor', 'user')),
            CONSTRAINT users_status_check CHECK (status IN ('active', 'inactive', 'banned'))
        )
        "#,
    ),
    (
        "posts",
        r#"
        CREATE TABLE IF NOT EXISTS posts (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            title VARCHAR(200) NOT NULL,
            slug VARCHAR(200) NOT NULL UNIQUE,
            content TEXT NOT NULL,
            excerpt TEXT,
            cover_image VARCHAR(500),
            status VARCHAR(20) NOT NULL DEFAULT 'draft',
            comment_status BOOLEAN NOT NULL DEFAULT TRUE,
            is_pinned BOOLEAN NOT NULL DEFAULT FALSE,
            post_password VARCHAR(100),
            view_count INTEGER NOT NULL DEFAULT 0,
            like_count INTEGER NOT NULL DEFAULT 0,
            published_at TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CONSTRAINT posts_status_check
                CHECK (status IN ('draft', 'published', 'archived', 'private'))
        )
        "#,
    ),
    (
        "comments",
        r#"
        CREATE TABLE IF NOT EXISTS comments (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            post_id UUID NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
            user_id UUID REFERENCES users(id) ON DELETE SET NULL,
            parent_id UUID REFERENCES comments(id) ON DELETE CASCADE,
            content TEXT NOT NULL,
            status VARCHAR(20) NOT NULL DEFAULT 'pending',
            like_count INTEGER NOT NULL DEFAULT 0,
            approved_at TIMESTAMPTZ,
            approved_by UUID REFERENCES users(id) ON DELETE SET NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CONSTRAINT comments_status_check
                CHECK (status IN ('pending', 'approved', 'spam', 'trash'))
        )
        "#,
    ),
    (
        "system_config",
        r#"
        CREATE TABLE IF NOT EXISTS system_config (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            config_key VARCHAR(100) NOT NULL UNIQUE,
            config_value JSONB NOT NULL,
            config_type VARCHAR(20) NOT NULL DEFAULT 'string',
            config_group VARCHAR(50) NOT NULL DEFAULT 'general',
            description TEXT,
            is_public BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CONSTRAINT system_config_type_check
                CHECK (config_type IN ('string', 'boolean', 'number', 'json', 'array'))
        )
        "#,
    ),
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_users_created_at ON users(created_at)",
    "CREATE INDEX IF NOT EXISTS idx_users_role ON users(role)",
    "CREATE INDEX IF NOT EXISTS idx_users_status ON users(status)",
    "CREATE INDEX IF NOT EXISTS idx_posts_created_at ON posts(created_at)",
    "CREATE INDEX IF NOT EXISTS idx_posts_published_at ON posts(published_at)",
    "CREATE INDEX IF NOT EXISTS idx_posts_status ON posts(status)",
    "CREATE INDEX IF NOT EXISTS idx_comments_created_at ON comments(created_at)",
    "CREATE INDEX IF NOT EXISTS idx_comments_parent_id ON comments(parent_id)",
    "CREATE INDEX IF NOT EXISTS idx_comments_post_id ON comments(post_id)",
    "CREATE INDEX IF NOT EXISTS idx_comments_status ON comments(status)",
    "CREATE INDEX IF NOT EXISTS idx_comments_user_id ON comments(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_comments_post_approved ON comments(post_id, status) \
     WHERE status = 'approved'",
    "CREATE INDEX IF NOT EXISTS idx_system_config_group ON system_config(config_group)",
    "CREATE INDEX IF NOT EXISTS idx_system_config_public ON system_config(is_public) \
     WHERE is_public = TRUE",
];

/// Create the blog tables and indexes if they do not exist yet.
///
/// Runs in one transaction; safe to call on every startup.
pub async fn run(pool: &PgPool) -> Result<(), DbError> {
    tracing::info!("running schema migrations");
    let mut tx = pool.begin().await?;

    // gen_random_uuid() is built in from PostgreSQL 13, older servers need pgcrypto
    sqlx::query("CREATE EXTENSION IF NOT EXISTS pgcrypto")
        .execute(&mut *tx)
        .await?;

    for (table, ddl) in TABLES {
        tracing::debug!(table, "ensuring table");
        sqlx::query(ddl).execute(&mut *tx).await?;
    }
    create_indexes(&mut tx).await?;

    tx.commit().await?;
    tracing::info!(tables = TABLES.len(), indexes = INDEXES.len(), "schema is up to date");
    Ok(())
}

async fn create_indexes(tx: &mut sqlx::Transaction<'_, sqlx::Postgres>) -> Result<(), DbError> {
    for ddl in INDEXES {
        sqlx::query(ddl).execute(&mut **tx).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_in_dependency_order() {
        let names: Vec<_> = TABLES.iter().map(|(name, _)| *name).collect();
        let pos = |t: &str| names.iter().position(|n| *n == t).unwrap();
        assert!(pos("users") < pos("comments"));
        assert!(pos("posts") < pos("comments"));
    }

    #[test]
    fn every_statement_is_idempotent() {
        for (_, ddl) in TABLES {
            assert!(ddl.contains("IF NOT EXISTS"));
        }
        for ddl in INDEXES {
            assert!(ddl.starts_with("CREATE INDEX IF NOT EXISTS"));
        }
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn migrations_run_twice() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = PgPool::connect(&url).await.expect("connect failed");
        run(&pool).await.expect("first run");
        run(&pool).await.expect("second run");
    }
}

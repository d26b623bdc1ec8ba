//! Site configuration repository

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::DbError;
use crate::models::{ConfigKey, ConfigType, ValidationError};

const COLUMNS: &str = "id, config_key, config_value, config_type, config_group, description, \
                       is_public, created_at, updated_at";

const DEFAULT_GROUP: &str = "general";

#[derive(Debug, Clone, FromRow)]
pub struct ConfigEntry {
    pub id: Uuid,
    pub config_key: String,
    pub config_value: Value,
    #[sqlx(try_from = "String")]
    pub config_type: ConfigType,
    pub config_group: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A value checked against its declared type
#[derive(Debug, Clone)]
pub struct NewConfigEntry {
    key: ConfigKey,
    value: Value,
    config_type: ConfigType,
    group: String,
    description: Option<String>,
    is_public: bool,
}

impl NewConfigEntry {
    pub fn new(key: ConfigKey, value: Value, config_type: ConfigType) -> Result<Self, ValidationError> {
        config_type.check(&value)?;
        Ok(Self {
            key,
            value,
            config_type,
            group: DEFAULT_GROUP.to_owned(),
            description: None,
            is_public: false,
        })
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn public(mut self, is_public: bool) -> Self {
        self.is_public = is_public;
        self
    }

    pub fn key(&self) -> &ConfigKey {
        &self.key
    }
}

pub struct ConfigRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> ConfigRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, key: &ConfigKey) -> Result<ConfigEntry, DbError> {
        sqlx::query_as::<_, ConfigEntry>(&format!(
            "SELECT {COLUMNS} FROM system_config WHERE config_key = $1"
        ))
        .bind(key.as_str())
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("config", key.as_str()))
    }

    /// Like [`get`](Self::get), but private entries are reported as missing.
    pub async fn get_public(&self, key: &ConfigKey) -> Result<ConfigEntry, DbError> {
        sqlx::query_as::<_, ConfigEntry>(&format!(
            "SELECT {COLUMNS} FROM system_config WHERE config_key = $1 AND is_public"
        ))
        .bind(key.as_str())
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("config", key.as_str()))
    }

    /// Public entries ordered by group, then key.
    pub async fn list_public(&self) -> Result<Vec<ConfigEntry>, DbError> {
        let entries = sqlx::query_as::<_, ConfigEntry>(&format!(
            r#"
            SELECT {COLUMNS} FROM system_config
            WHERE is_public
            ORDER BY config_group, config_key
            "#
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(entries)
    }

    /// Every entry, private ones included.
    pub async fn list_all(&self) -> Result<Vec<ConfigEntry>, DbError> {
        let entries = sqlx::query_as::<_, ConfigEntry>(&format!(
            "SELECT {COLUMNS} FROM system_config ORDER BY config_group, config_key"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(entries)
    }

    /// Insert or replace the entry for its key.
    pub async fn upsert(&self, entry: NewConfigEntry) -> Result<ConfigEntry, DbError> {
        let saved = sqlx::query_as::<_, ConfigEntry>(&format!(
            r#"
            INSERT INTO system_config
                (config_key, config_value, config_type, config_group, description, is_public)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (config_key) DO UPDATE SET
                config_value = EXCLUDED.config_value,
                config_type = EXCLUDED.config_type,
                config_group = EXCLUDED.config_group,
                description = EXCLUDED.description,
                is_public = EXCLUDED.is_public,
                updated_at = NOW()
            RETURNING {COLUMNS}
            "#
        ))
        .bind(entry.key.as_str())
        .bind(&entry.value)
        .bind(entry.config_type.as_str())
        .bind(&entry.group)
        .bind(entry.description.as_deref())
        .bind(entry.is_public)
        .fetch_one(self.pool)
        .await?;

        tracing::info!(key = %saved.config_key, public = saved.is_public, "config entry saved");
        Ok(saved)
    }

    pub async fn delete(&self, key: &ConfigKey) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM system_config WHERE config_key = $1")
            .bind(key.as_str())
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::not_found("config", key.as_str()));
        }
        Ok(())
    }
}

//! Public site configuration endpoints

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use serde_json::Value;

use crate::db::repos::{ConfigEntry, ConfigRepo};
use crate::http::error::ApiError;
use crate::http::extractors::ValidConfigKey;
use crate::http::response::ApiResponse;
use crate::models::ConfigType;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub key: String,
    pub value: Value,
    #[serde(rename = "type")]
    pub config_type: ConfigType,
    pub group: String,
    pub description: Option<String>,
}

impl From<ConfigEntry> for ConfigResponse {
    fn from(e: ConfigEntry) -> Self {
        Self {
            key: e.config_key,
            value: e.config_value,
            config_type: e.config_type,
            group: e.config_group,
            description: e.description,
        }
    }
}

/// GET /api/config - every public entry
async fn list_config(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<ConfigResponse>>>, ApiError> {
    let entries = ConfigRepo::new(state.db.pool()).list_public().await?;
    Ok(Json(state.success(
        entries.into_iter().map(ConfigResponse::from).collect(),
    )))
}

/// GET /api/config/{key} - private keys answer 404
async fn get_config(
    State(state): State<Arc<AppState>>,
    ValidConfigKey(key): ValidConfigKey,
) -> Result<Json<ApiResponse<ConfigResponse>>, ApiError> {
    let entry = ConfigRepo::new(state.db.pool()).get_public(&key).await?;
    Ok(Json(state.success(entry.into())))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/config", get(list_config))
        .route("/api/config/{key}", get(get_config))
}

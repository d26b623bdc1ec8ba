//! Landing endpoint

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::http::locale::RequestLocale;
use crate::state::AppState;

#[derive(Serialize)]
pub struct Greeting {
    pub message: String,
}

/// GET / - greeting in the request locale
async fn root(State(state): State<Arc<AppState>>, locale: RequestLocale) -> Json<Greeting> {
    Json(Greeting {
        message: state.translator.message_in(locale.as_str(), "greeting", None),
    })
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(root))
}

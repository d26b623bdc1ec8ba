//! Per-request locale resolution
//!
//! Reads `?lang=`, `X-Locale`, `X-Language` and `Accept-Language` (in that
//! priority order), then runs the rest of the stack with the resolved
//! locale installed as the current locale and as a [`RequestLocale`]
//! extension. The response gets a `Content-Language` header, and error
//! envelopes are re-rendered in that locale.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{FromRequestParts, Query, Request, State};
use axum::http::header::{HeaderName, ACCEPT_LANGUAGE, CONTENT_LANGUAGE, CONTENT_LENGTH};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue, Uri};
use axum::middleware::Next;
use axum::response::Response;
use ohmyblog_core::i18n::{with_locale, LocaleHints};

use super::error::{ApiError, PendingMessage};
use crate::state::AppState;

pub const LANG_QUERY_PARAM: &str = "lang";
pub static X_LOCALE: HeaderName = HeaderName::from_static("x-locale");
pub static X_LANGUAGE: HeaderName = HeaderName::from_static("x-language");

/// Locale resolved for the current request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLocale(pub String);

impl RequestLocale {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for RequestLocale
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestLocale>()
            .cloned()
            .ok_or_else(|| ApiError::Internal {
                message: "locale layer is not installed".into(),
            })
    }
}

/// Middleware body, installed with `axum::middleware::from_fn_with_state`.
pub async fn resolve_locale(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let locale = {
        let query = lang_param(request.uri());
        let headers = request.headers();
        let hints = LocaleHints {
            query: query.as_deref(),
            x_locale: header(headers, &X_LOCALE),
            x_language: header(headers, &X_LANGUAGE),
            accept_language: header(headers, &ACCEPT_LANGUAGE),
        };
        state.resolver.resolve(&hints).to_owned()
    };
    tracing::debug!(%locale, "resolved request locale");

    request.extensions_mut().insert(RequestLocale(locale.clone()));
    let mut response = with_locale(locale.clone(), next.run(request)).await;

    if let Some(pending) = response.extensions_mut().remove::<PendingMessage>() {
        translate_error_body(&mut response, &pending, &state, &locale);
    }
    match HeaderValue::from_str(&locale) {
        Ok(value) => {
            response.headers_mut().insert(CONTENT_LANGUAGE, value);
        }
        Err(_) => tracing::warn!(%locale, "locale is not a valid header value"),
    }
    response
}

/// The `lang` query parameter. A repeated key resolves to its last value.
fn lang_param(uri: &Uri) -> Option<String> {
    let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(uri).ok()?;
    pairs
        .into_iter()
        .rev()
        .find_map(|(key, value)| (key == LANG_QUERY_PARAM).then_some(value))
}

fn header<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn translate_error_body(
    response: &mut Response,
    pending: &PendingMessage,
    state: &AppState,
    locale: &str,
) {
    let Some(body) = pending.envelope(|t| t.render(&state.translator, locale)) else {
        return;
    };
    match serde_json::to_vec(&body) {
        Ok(bytes) => {
            *response.body_mut() = Body::from(bytes);
            response.headers_mut().remove(CONTENT_LENGTH);
        }
        Err(err) => tracing::warn!(error = %err, "failed to re-render error envelope"),
    }
}

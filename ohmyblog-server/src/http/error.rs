//! API error type with IntoResponse
//!
//! Errors become failure envelopes with a matching HTTP status. The
//! message is rendered in English first; the locale layer swaps in the
//! translation for the request locale using the [`PendingMessage`] left
//! in the response extensions.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ohmyblog_core::i18n::{FluentArgs, Translator};

use super::response::{ApiResponse, ErrorCode, ErrorDetail};
use crate::db::DbError;
use crate::models::ValidationError;

#[derive(Debug)]
pub enum ApiError {
    /// Input failed domain validation (400)
    Validation(ValidationError),

    /// Body or query could not be parsed (400)
    BadRequest { reason: String },

    /// Resource not found (404)
    NotFound { resource: &'static str, id: String },

    /// Unique constraint hit (409)
    Conflict { resource: String, detail: String },

    /// Operation not allowed; `key` names the message (403)
    Forbidden { key: &'static str },

    /// Database error (500, logged)
    Database(DbError),

    /// Internal error (500, logged)
    Internal { message: String },
}

/// A message to translate: key, arguments and English fallback
#[derive(Debug, Clone, PartialEq)]
pub struct Translatable {
    pub key: &'static str,
    pub args: Vec<(&'static str, String)>,
    pub fallback: String,
}

impl Translatable {
    fn new(key: &'static str, fallback: impl Into<String>) -> Self {
        Self {
            key,
            args: Vec::new(),
            fallback: fallback.into(),
        }
    }

    fn arg(mut self, name: &'static str, value: impl ToString) -> Self {
        self.args.push((name, value.to_string()));
        self
    }

    pub fn render(&self, translator: &Translator, locale: &str) -> String {
        let mut args = FluentArgs::new();
        for (name, value) in &self.args {
            args.set(*name, value.clone());
        }
        let text = translator.message_in(locale, self.key, Some(&args));
        // A key missing from every catalog comes back verbatim
        if text == self.key {
            self.fallback.clone()
        } else {
            text
        }
    }
}

/// Untranslated failure envelope carried in response extensions
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMessage {
    pub code: ErrorCode,
    pub message: Translatable,
    pub errors: Vec<(Option<String>, Translatable)>,
}

impl PendingMessage {
    fn new(code: ErrorCode, message: Translatable) -> Self {
        Self {
            code,
            message,
            errors: Vec::new(),
        }
    }

    fn detail(mut self, field: Option<&str>, message: Translatable) -> Self {
        self.errors.push((field.map(str::to_owned), message));
        self
    }

    /// Build the envelope, translating with `render`.
    pub fn envelope(&self, render: impl Fn(&Translatable) -> String) -> Option<ApiResponse<()>> {
        let details = self
            .errors
            .iter()
            .map(|(field, message)| ErrorDetail {
                field: field.clone(),
                message: render(message),
            })
            .collect();
        ApiResponse::fail(self.code, render(&self.message))
            .ok()
            .map(|body| body.with_errors(details))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::Database(_) | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(_) | Self::BadRequest { .. } => ErrorCode::InvalidParam,
            Self::NotFound { resource, .. } => match *resource {
                "user" => ErrorCode::UserNotFound,
                "post" => ErrorCode::PostNotFound,
                "comment" => ErrorCode::CommentNotFound,
                _ => ErrorCode::NotFound,
            },
            Self::Conflict { resource, .. } => match resource.as_str() {
                "users" => ErrorCode::UserExists,
                "posts" => ErrorCode::PostAlreadyExists,
                _ => ErrorCode::InvalidParam,
            },
            Self::Forbidden { .. } => ErrorCode::Forbidden,
            Self::Database(_) | Self::Internal { .. } => ErrorCode::InternalError,
        }
    }

    fn pending(&self) -> PendingMessage {
        let code = self.code();
        let generic = Translatable::new(code.message_key(), default_text(code));
        match self {
            Self::Validation(e) => PendingMessage::new(code, generic)
                .detail(Some(e.field()), validation_message(e)),
            Self::BadRequest { reason } => PendingMessage::new(code, generic)
                .detail(
                    None,
                    Translatable::new("error-malformed-request", reason.clone()).arg("reason", reason),
                ),
            Self::NotFound { resource, id } => PendingMessage::new(
                code,
                Translatable::new(code.message_key(), format!("{resource} '{id}' not found"))
                    .arg("id", id),
            ),
            Self::Conflict { resource, detail } => {
                let message = if code == ErrorCode::InvalidParam {
                    Translatable::new("error-conflict", format!("{resource} already exists"))
                        .arg("resource", resource)
                } else {
                    generic
                };
                PendingMessage::new(code, message).detail(
                    None,
                    Translatable::new("error-conflict-detail", detail.clone()).arg("detail", detail),
                )
            }
            Self::Forbidden { key } => {
                PendingMessage::new(code, Translatable::new(*key, default_text(code)))
            }
            Self::Database(e) => {
                tracing::error!(error = %e, "database error");
                PendingMessage::new(code, generic)
            }
            Self::Internal { message } => {
                tracing::error!(%message, "internal error");
                PendingMessage::new(code, generic)
            }
        }
    }
}

fn default_text(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::Success => "OK",
        ErrorCode::InvalidParam => "invalid parameter",
        ErrorCode::Unauthorized => "unauthorized",
        ErrorCode::Forbidden => "forbidden",
        ErrorCode::NotFound => "resource not found",
        ErrorCode::InternalError => "an internal error occurred",
        ErrorCode::TooManyRequests => "too many requests",
        ErrorCode::UserNotFound => "user not found",
        ErrorCode::UserExists => "user already exists",
        ErrorCode::UserPasswordError => "wrong password",
        ErrorCode::UserDisabled => "user is disabled",
        ErrorCode::PostNotFound => "post not found",
        ErrorCode::PostAlreadyExists => "post already exists",
        ErrorCode::CommentNotFound => "comment not found",
    }
}

fn validation_message(e: &ValidationError) -> Translatable {
    let fallback = e.to_string();
    match e {
        ValidationError::Empty { field } => {
            Translatable::new("validation-empty", fallback).arg("field", field)
        }
        ValidationError::TooLong { field, max } => {
            Translatable::new("validation-too-long", fallback)
                .arg("field", field)
                .arg("max", max)
        }
        ValidationError::InvalidFormat { field, .. } => {
            Translatable::new("validation-invalid-format", fallback).arg("field", field)
        }
        ValidationError::InvalidVariant { field, value } => {
            Translatable::new("validation-invalid-variant", fallback)
                .arg("field", field)
                .arg("value", value)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let pending = self.pending();
        let Some(body) = pending.envelope(|t| t.fallback.clone()) else {
            return status.into_response();
        };
        let mut response = (status, Json(body)).into_response();
        response.extensions_mut().insert(pending);
        response
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { resource, id } => Self::NotFound { resource, id },
            DbError::Conflict { resource, detail } => Self::Conflict { resource, detail },
            DbError::Constraint { detail } => Self::BadRequest { reason: detail },
            DbError::CommentsClosed { .. } => Self::Forbidden {
                key: "comments-closed",
            },
            DbError::Sqlx(_) => Self::Database(e),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest {
            reason: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest {
            reason: rejection.body_text(),
        }
    }
}

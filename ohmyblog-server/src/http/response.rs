//! Uniform JSON envelope for every API response
//!
//! ```json
//! {"success": true, "code": 0, "message": "OK", "data": {...}}
//! {"success": false, "code": 300001, "message": "...", "data": null, "errors": [{"field": "slug", "message": "..."}]}
//! ```
//!
//! `data` is always present and is `null` on failure. Absent `errors` and
//! `extra` are omitted.

use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Business error codes, grouped by module: `1xxxxx` common, `2xxxxx`
/// users, `3xxxxx` posts, `4xxxxx` comments. Zero is success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "u32")]
pub enum ErrorCode {
    Success = 0,

    InvalidParam = 100001,
    Unauthorized = 100002,
    Forbidden = 100003,
    NotFound = 100004,
    InternalError = 100005,
    TooManyRequests = 100006,

    UserNotFound = 200001,
    UserExists = 200002,
    UserPasswordError = 200003,
    UserDisabled = 200004,

    PostNotFound = 300001,
    PostAlreadyExists = 300002,

    CommentNotFound = 400001,
}

impl ErrorCode {
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// Translation key of the default message for this code.
    pub fn message_key(self) -> &'static str {
        match self {
            Self::Success => "ok",
            Self::InvalidParam => "error-invalid-param",
            Self::Unauthorized => "error-unauthorized",
            Self::Forbidden => "error-forbidden",
            Self::NotFound => "error-not-found",
            Self::InternalError => "error-internal",
            Self::TooManyRequests => "error-too-many-requests",
            Self::UserNotFound => "user-not-found",
            Self::UserExists => "user-exists",
            Self::UserPasswordError => "user-password-error",
            Self::UserDisabled => "user-disabled",
            Self::PostNotFound => "post-not-found",
            Self::PostAlreadyExists => "post-already-exists",
            Self::CommentNotFound => "comment-not-found",
        }
    }
}

impl From<ErrorCode> for u32 {
    fn from(code: ErrorCode) -> Self {
        code.as_u32()
    }
}

/// One problem with the request, optionally tied to a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl ErrorDetail {
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("a failure response cannot carry the success code")]
pub struct SuccessCodeInFailure;

#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub code: ErrorCode,
    pub message: String,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ErrorDetail>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<Map<String, Value>>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            code: ErrorCode::Success,
            message: message.into(),
            data: Some(data),
            errors: None,
            extra: None,
        }
    }

    /// Attach an entry to the free-form `extra` object.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }
}

impl ApiResponse<()> {
    /// Failure envelope. `code` must not be [`ErrorCode::Success`].
    pub fn fail(code: ErrorCode, message: impl Into<String>) -> Result<Self, SuccessCodeInFailure> {
        if code == ErrorCode::Success {
            return Err(SuccessCodeInFailure);
        }
        Ok(Self {
            success: false,
            code,
            message: message.into(),
            data: None,
            errors: None,
            extra: None,
        })
    }

    pub fn with_errors(mut self, errors: Vec<ErrorDetail>) -> Self {
        if !errors.is_empty() {
            self.errors = Some(errors);
        }
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_omits_empty_fields() {
        let body = serde_json::to_value(ApiResponse::success(json!({"id": 1}), "OK")).unwrap();
        assert_eq!(
            body,
            json!({"success": true, "code": 0, "message": "OK", "data": {"id": 1}})
        );
    }

    #[test]
    fn failure_serializes_numeric_code() {
        let body = ApiResponse::fail(ErrorCode::PostNotFound, "missing")
            .unwrap()
            .with_errors(vec![ErrorDetail::field("slug", "no such post")]);
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({
                "success": false,
                "code": 300001,
                "message": "missing",
                "data": null,
                "errors": [{"field": "slug", "message": "no such post"}]
            })
        );
    }

    #[test]
    fn failure_always_carries_null_data() {
        let body = ApiResponse::fail(ErrorCode::NotFound, "gone").unwrap();
        let body = serde_json::to_value(body).unwrap();
        let object = body.as_object().unwrap();
        assert!(object.contains_key("data"));
        assert!(object["data"].is_null());
        assert!(!object.contains_key("errors"));
        assert!(!object.contains_key("extra"));
    }

    #[test]
    fn fail_refuses_success_code() {
        assert_eq!(
            ApiResponse::fail(ErrorCode::Success, "nope").unwrap_err(),
            SuccessCodeInFailure
        );
    }

    #[test]
    fn extra_accumulates() {
        let body = ApiResponse::success((), "OK")
            .with_extra("request_id", "abc")
            .with_extra("page", 2);
        let extra = body.extra.unwrap();
        assert_eq!(extra["request_id"], json!("abc"));
        assert_eq!(extra["page"], json!(2));
    }

    #[test]
    fn code_segments() {
        assert_eq!(ErrorCode::InvalidParam.as_u32(), 100001);
        assert_eq!(ErrorCode::UserDisabled.as_u32(), 200004);
        assert_eq!(ErrorCode::CommentNotFound.as_u32(), 400001);
        assert_eq!(ErrorCode::Success.message_key(), "ok");
    }
}

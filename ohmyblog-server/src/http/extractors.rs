//! Custom Axum extractors

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use uuid::Uuid;

use super::error::ApiError;
use crate::models::{ConfigKey, Slug, ValidationError};

/// The single path parameter as a string.
///
/// Axum rejects segments that do not percent-decode to UTF-8; that surfaces
/// as an invalid `field`, never as an empty one.
async fn path_param<S>(
    parts: &mut Parts,
    state: &S,
    field: &'static str,
) -> Result<String, ApiError>
where
    S: Send + Sync,
{
    let Path(value): Path<String> =
        Path::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                tracing::debug!(field, error = %rejection.body_text(), "path parameter rejected");
                ApiError::Validation(ValidationError::InvalidFormat {
                    field,
                    reason: "malformed path parameter",
                })
            })?;
    Ok(value)
}

/// UUID taken from the single path parameter
pub struct ValidUuid(pub Uuid);

impl<S> FromRequestParts<S> for ValidUuid
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let id = path_param(parts, state, "id").await?;

        let uuid = Uuid::parse_str(&id).map_err(|_| {
            ApiError::Validation(ValidationError::InvalidFormat {
                field: "id",
                reason: "invalid UUID format",
            })
        })?;

        Ok(Self(uuid))
    }
}

/// Post slug taken from the single path parameter
pub struct ValidSlug(pub Slug);

impl<S> FromRequestParts<S> for ValidSlug
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let slug = path_param(parts, state, "slug").await?;
        Ok(Self(Slug::new(&slug)?))
    }
}

/// Site configuration key taken from the single path parameter
pub struct ValidConfigKey(pub ConfigKey);

impl<S> FromRequestParts<S> for ValidConfigKey
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let key = path_param(parts, state, "config_key").await?;
        Ok(Self(ConfigKey::new(&key)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    async fn status_of(router: Router, uri: &str) -> StatusCode {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        router.oneshot(request).await.unwrap().status()
    }

    fn slug_router() -> Router {
        Router::new().route(
            "/{post}",
            get(|ValidSlug(slug): ValidSlug| async move { slug.as_str().to_owned() }),
        )
    }

    #[tokio::test]
    async fn path_rejection_is_an_invalid_format() {
        let mut parts = Request::builder()
            .uri("/%FF")
            .body(())
            .unwrap()
            .into_parts()
            .0;
        // No route matched, so no path params were recorded.
        let err = path_param(&mut parts, &(), "slug").await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Validation(ValidationError::InvalidFormat { field: "slug", .. })
        ));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn slug_extractor_accepts_and_rejects() {
        assert_eq!(status_of(slug_router(), "/hello-world").await, StatusCode::OK);
        assert_eq!(status_of(slug_router(), "/Not_A_Slug").await, StatusCode::BAD_REQUEST);
        assert_eq!(status_of(slug_router(), "/%FF").await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn config_key_extractor_validates() {
        let router = Router::new().route(
            "/{key}",
            get(|ValidConfigKey(key): ValidConfigKey| async move { key.as_str().to_owned() }),
        );
        assert_eq!(status_of(router.clone(), "/site.title").await, StatusCode::OK);
        assert_eq!(status_of(router.clone(), "/Site%20Title").await, StatusCode::BAD_REQUEST);
        assert_eq!(status_of(router, "/%FF").await, StatusCode::BAD_REQUEST);
    }
}

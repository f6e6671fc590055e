use axum::extract::{FromRequest, FromRequestParts, Path};
use axum::http::request::Parts;
use foodgram_core::QueryParams;
use std::convert::Infallible;

use super::error::ApiError;

/// `axum::Json` with rejections rendered as `{"detail": "..."}`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Raw query pairs plus the request path, for filters and page links.
#[derive(Debug, Clone)]
pub struct ListQuery {
    pub params: QueryParams,
    pub path: String,
}

impl<S> FromRequestParts<S> for ListQuery
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Nested routers see a stripped URI; the original one has the full path.
        let uri = parts
            .extensions
            .get::<axum::extract::OriginalUri>()
            .map(|original| &original.0)
            .unwrap_or(&parts.uri);

        Ok(ListQuery {
            params: QueryParams::parse(uri.query()),
            path: uri.path().to_string(),
        })
    }
}

/// Integer id from the `{id}` path segment. Anything unparsable is a 404.
#[derive(Debug, Clone, Copy)]
pub struct ObjectId(pub i32);

impl<S> FromRequestParts<S> for ObjectId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i32>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::NotFound)?;
        Ok(ObjectId(id))
    }
}

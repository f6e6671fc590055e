use crate::api::ErrorResponse;
use crate::db::DbPool;
use crate::models::User;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use super::db::find_session;

/// Schemes accepted in the `Authorization` header.
const SCHEMES: &[&str] = &["Token", "Bearer"];

/// Extractor that validates the Authorization header and provides the authenticated user.
///
/// ```ignore
/// async fn my_handler(AuthUser(user): AuthUser) -> impl IntoResponse {
///     // user is the authenticated User
/// }
/// ```
pub struct AuthUser(pub User);

/// Like [`AuthUser`] but also exposes which session the token belongs to.
pub struct CurrentSession {
    pub session_id: Uuid,
    pub user: User,
}

/// The viewer, when a token was supplied.
///
/// A missing header means an anonymous viewer; a bad token is still rejected.
pub struct MaybeAuthUser(pub Option<User>);

impl MaybeAuthUser {
    pub fn id(&self) -> Option<i32> {
        self.0.as_ref().map(|user| user.id)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    MissingCredentials,
    InvalidHeader,
    NoCredentials,
    TokenHasSpaces,
    InvalidToken,
    Unavailable,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingCredentials => (
                StatusCode::UNAUTHORIZED,
                "Authentication credentials were not provided.",
            ),
            AuthError::InvalidHeader => (
                StatusCode::UNAUTHORIZED,
                "Invalid token header. Token string should not contain invalid characters.",
            ),
            AuthError::NoCredentials => (
                StatusCode::UNAUTHORIZED,
                "Invalid token header. No credentials provided.",
            ),
            AuthError::TokenHasSpaces => (
                StatusCode::UNAUTHORIZED,
                "Invalid token header. Token string should not contain spaces.",
            ),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid token."),
            AuthError::Unavailable => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error.",
            ),
        };

        (
            status,
            [(header::WWW_AUTHENTICATE, "Token")],
            Json(ErrorResponse {
                detail: message.to_string(),
            }),
        )
            .into_response()
    }
}

/// Pull the token out of an `Authorization` value.
///
/// `Ok(None)` means some other scheme was used and the request is anonymous.
pub fn parse_authorization(value: &str) -> Result<Option<&str>, AuthError> {
    let mut parts = value.split_whitespace();
    let Some(scheme) = parts.next() else {
        return Ok(None);
    };
    if !SCHEMES.iter().any(|s| s.eq_ignore_ascii_case(scheme)) {
        return Ok(None);
    }
    let token = parts.next().ok_or(AuthError::NoCredentials)?;
    if parts.next().is_some() {
        return Err(AuthError::TokenHasSpaces);
    }
    Ok(Some(token))
}

fn header_token(parts: &Parts) -> Result<Option<&str>, AuthError> {
    match parts.headers.get(header::AUTHORIZATION) {
        None => Ok(None),
        Some(value) => {
            let value = value.to_str().map_err(|_| AuthError::InvalidHeader)?;
            parse_authorization(value)
        }
    }
}

async fn resolve<S>(parts: &Parts, state: &S) -> Result<Option<(Uuid, User)>, AuthError>
where
    S: Sync,
    Arc<DbPool>: FromRef<S>,
{
    let Some(token) = header_token(parts)? else {
        return Ok(None);
    };

    let pool = Arc::<DbPool>::from_ref(state);
    let mut conn = pool.get().map_err(|e| {
        tracing::error!("Failed to get DB connection for auth: {}", e);
        AuthError::Unavailable
    })?;

    match find_session(&mut conn, token) {
        Ok(Some(found)) => Ok(Some(found)),
        Ok(None) => Err(AuthError::InvalidToken),
        Err(e) => {
            tracing::error!("Failed to look up session: {}", e);
            Err(AuthError::Unavailable)
        }
    }
}

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
    Arc<DbPool>: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let (session_id, user) = resolve(parts, state)
            .await?
            .ok_or(AuthError::MissingCredentials)?;
        Ok(CurrentSession { session_id, user })
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<DbPool>: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = CurrentSession::from_request_parts(parts, state).await?;
        Ok(AuthUser(session.user))
    }
}

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
    Arc<DbPool>: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let found = resolve(parts, state).await?;
        Ok(MaybeAuthUser(found.map(|(_, user)| user)))
    }
}

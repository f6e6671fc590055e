use crate::api::{ApiError, ApiJson, ApiResult, ErrorResponse, ValidationErrorResponse};
use crate::auth::{delete_user_sessions, hash_password, verify_password, CurrentSession};
use crate::db::DbPool;
use crate::schema::users;
use axum::{extract::State, http::StatusCode};
use diesel::prelude::*;
use foodgram_core::validation::required_untrimmed;
use foodgram_core::FieldErrors;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SetPasswordRequest {
    pub new_password: Option<String>,
    pub current_password: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/users/set_password",
    tag = "users",
    request_body = SetPasswordRequest,
    responses(
        (status = 204, description = "Password changed; other sessions revoked"),
        (status = 400, description = "Missing fields or wrong current password", body = ValidationErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn set_password(
    session: CurrentSession,
    State(pool): State<Arc<DbPool>>,
    ApiJson(req): ApiJson<SetPasswordRequest>,
) -> ApiResult<StatusCode> {
    let mut errors = FieldErrors::new();
    let new_password = required_untrimmed(&mut errors, "new_password", req.new_password.as_deref());
    let current_password =
        required_untrimmed(&mut errors, "current_password", req.current_password.as_deref());
    let (Some(new_password), Some(current_password)) = (new_password, current_password) else {
        return Err(errors.into());
    };

    let user = &session.user;
    if !verify_password(current_password, &user.password_hash) {
        return Err(ApiError::field("current_password", "Invalid password."));
    }

    let password_hash = hash_password(new_password)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("failed to hash password: {}", e)))?;

    let mut conn = pool.get()?;
    let revoked = conn.transaction::<_, ApiError, _>(|conn| {
        diesel::update(users::table.find(user.id))
            .set(users::password_hash.eq(&password_hash))
            .execute(conn)?;
        Ok(delete_user_sessions(conn, user.id, Some(session.session_id))?)
    })?;

    tracing::info!(user_id = user.id, revoked_sessions = revoked, "Changed password");
    Ok(StatusCode::NO_CONTENT)
}

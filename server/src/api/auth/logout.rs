use crate::api::{ApiResult, ErrorResponse};
use crate::auth::{delete_session, CurrentSession};
use crate::db::DbPool;
use axum::{extract::State, http::StatusCode};
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/api/auth/token/logout",
    tag = "auth",
    responses(
        (status = 204, description = "Token revoked"),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn logout(
    session: CurrentSession,
    State(pool): State<Arc<DbPool>>,
) -> ApiResult<StatusCode> {
    let mut conn = pool.get()?;
    delete_session(&mut conn, session.session_id)?;
    tracing::info!(user_id = session.user.id, "Revoked auth token");
    Ok(StatusCode::NO_CONTENT)
}

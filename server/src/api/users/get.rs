use crate::api::users::profile::{load_profile, UserResponse};
use crate::api::{ApiResult, ErrorResponse, ObjectId};
use crate::auth::{AuthUser, MaybeAuthUser};
use crate::config::Config;
use crate::db::DbPool;
use crate::models::User;
use crate::schema::users;
use axum::{extract::State, Json};
use diesel::prelude::*;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "users",
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn get_user(
    viewer: MaybeAuthUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    ObjectId(id): ObjectId,
) -> ApiResult<Json<UserResponse>> {
    let mut conn = pool.get()?;

    let user: User = users::table
        .find(id)
        .select(User::as_select())
        .first(&mut conn)?;

    let profile = load_profile(&mut conn, viewer.id(), user, &config.public_url)?;
    Ok(Json(profile))
}

#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "users",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn me(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
) -> ApiResult<Json<UserResponse>> {
    let mut conn = pool.get()?;
    let viewer = Some(user.id);
    let profile = load_profile(&mut conn, viewer, user, &config.public_url)?;
    Ok(Json(profile))
}

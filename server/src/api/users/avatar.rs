use crate::api::media::{delete_if_orphaned, image_url, store_image};
use crate::api::{ApiError, ApiJson, ApiResult, ErrorResponse, ValidationErrorResponse};
use crate::auth::AuthUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::schema::users;
use axum::{extract::State, http::StatusCode, Json};
use diesel::prelude::*;
use foodgram_core::validation::required_text;
use foodgram_core::{decode_data_uri, FieldErrors};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AvatarRequest {
    /// `data:image/<ext>;base64,<payload>`
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AvatarResponse {
    pub avatar: String,
}

#[utoipa::path(
    put,
    path = "/api/users/me/avatar",
    tag = "users",
    request_body = AvatarRequest,
    responses(
        (status = 200, description = "Avatar updated", body = AvatarResponse),
        (status = 400, description = "Missing or invalid image", body = ValidationErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn set_avatar(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    ApiJson(req): ApiJson<AvatarRequest>,
) -> ApiResult<Json<AvatarResponse>> {
    let mut errors = FieldErrors::new();
    let Some(raw) = required_text(&mut errors, "avatar", req.avatar.as_deref()) else {
        return Err(errors.into());
    };
    let image = decode_data_uri(raw).map_err(|e| ApiError::field("avatar", e.to_string()))?;

    let mut conn = pool.get()?;
    let image_id = conn.transaction::<_, ApiError, _>(|conn| {
        let image_id = store_image(conn, &image)?;
        diesel::update(users::table.find(user.id))
            .set(users::avatar_id.eq(Some(image_id)))
            .execute(conn)?;
        if let Some(previous) = user.avatar_id {
            delete_if_orphaned(conn, previous)?;
        }
        Ok(image_id)
    })?;

    tracing::info!(user_id = user.id, image_id = %image_id, "Updated avatar");

    Ok(Json(AvatarResponse {
        avatar: image_url(&config.public_url, image_id),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/users/me/avatar",
    tag = "users",
    responses(
        (status = 204, description = "Avatar removed"),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_avatar(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
) -> ApiResult<StatusCode> {
    let mut conn = pool.get()?;
    conn.transaction::<_, ApiError, _>(|conn| {
        diesel::update(users::table.find(user.id))
            .set(users::avatar_id.eq(None::<Uuid>))
            .execute(conn)?;
        if let Some(previous) = user.avatar_id {
            delete_if_orphaned(conn, previous)?;
        }
        Ok(())
    })?;

    Ok(StatusCode::NO_CONTENT)
}

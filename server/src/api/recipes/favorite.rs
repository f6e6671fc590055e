use super::collection::RecipeCollection;
use super::detail::RecipeMinified;
use crate::api::{ApiResult, ErrorResponse, ObjectId, RuleErrorResponse};
use crate::auth::AuthUser;
use crate::config::Config;
use crate::db::DbPool;
use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/favorite",
    tag = "recipes",
    params(
        ("id" = i32, Path, description = "Recipe ID")
    ),
    responses(
        (status = 201, description = "Added to favorites", body = RecipeMinified),
        (status = 400, description = "Already in favorites", body = RuleErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn add_favorite(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    ObjectId(id): ObjectId,
) -> ApiResult<(StatusCode, Json<RecipeMinified>)> {
    RecipeCollection::Favorites.add(&pool, &config, &user, id)
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/favorite",
    tag = "recipes",
    params(
        ("id" = i32, Path, description = "Recipe ID")
    ),
    responses(
        (status = 204, description = "Removed from favorites"),
        (status = 400, description = "Not in favorites", body = RuleErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn remove_favorite(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    ObjectId(id): ObjectId,
) -> ApiResult<StatusCode> {
    RecipeCollection::Favorites.remove(&pool, &user, id)
}

use super::detail::{load_recipe, RecipeResponse};
use crate::api::{ApiResult, ErrorResponse, ObjectId};
use crate::auth::MaybeAuthUser;
use crate::config::Config;
use crate::db::DbPool;
use axum::{extract::State, Json};
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = i32, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe", body = RecipeResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    )
)]
pub async fn get_recipe(
    viewer: MaybeAuthUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    ObjectId(id): ObjectId,
) -> ApiResult<Json<RecipeResponse>> {
    let mut conn = pool.get()?;
    let recipe = load_recipe(&mut conn, viewer.id(), id, &config.public_url)?;
    Ok(Json(recipe))
}

use super::detail::find_recipe;
use crate::api::media::delete_if_orphaned;
use crate::api::{ApiError, ApiResult, ErrorResponse, ObjectId};
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::schema::recipes;
use axum::{extract::State, http::StatusCode};
use diesel::prelude::*;
use std::sync::Arc;

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = i32, Path, description = "Recipe ID")
    ),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_recipe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    ObjectId(id): ObjectId,
) -> ApiResult<StatusCode> {
    let mut conn = pool.get()?;

    let recipe = find_recipe(&mut conn, id)?;
    if recipe.author_id != user.id {
        return Err(ApiError::Forbidden);
    }

    // Join rows go with the recipe via ON DELETE CASCADE
    conn.transaction::<_, ApiError, _>(|conn| {
        diesel::delete(recipes::table.find(recipe.id)).execute(conn)?;
        delete_if_orphaned(conn, recipe.image_id)?;
        Ok(())
    })?;

    tracing::info!(user_id = user.id, recipe_id = recipe.id, "Deleted recipe");
    Ok(StatusCode::NO_CONTENT)
}

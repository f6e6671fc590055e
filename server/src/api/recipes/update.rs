use super::detail::{find_recipe, load_recipe, RecipeResponse};
use super::write::{check_references, replace_components, validate_update, RecipeWriteRequest};
use crate::api::media::{delete_if_orphaned, store_image};
use crate::api::{ApiError, ApiJson, ApiResult, ErrorResponse, ObjectId, ValidationErrorResponse};
use crate::auth::AuthUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::models::RecipeChanges;
use crate::schema::recipes;
use axum::{extract::State, Json};
use diesel::prelude::*;
use std::sync::Arc;

#[utoipa::path(
    patch,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = i32, Path, description = "Recipe ID")
    ),
    request_body = RecipeWriteRequest,
    responses(
        (status = 200, description = "Recipe updated", body = RecipeResponse),
        (status = 400, description = "Invalid fields", body = ValidationErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_recipe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    ObjectId(id): ObjectId,
    ApiJson(req): ApiJson<RecipeWriteRequest>,
) -> ApiResult<Json<RecipeResponse>> {
    let mut conn = pool.get()?;

    let recipe = find_recipe(&mut conn, id)?;
    if recipe.author_id != user.id {
        return Err(ApiError::Forbidden);
    }

    let update = validate_update(&req)?;

    conn.transaction::<_, ApiError, _>(|conn| {
        check_references(conn, &update.ingredients, update.tags.as_deref())?;

        let image_id = update
            .image
            .as_ref()
            .map(|image| store_image(conn, image))
            .transpose()?;

        let changes = RecipeChanges {
            name: update.name,
            image_id,
            text: update.text,
            cooking_time: update.cooking_time,
        };
        if !changes.is_empty() {
            diesel::update(recipes::table.find(recipe.id))
                .set(&changes)
                .execute(conn)?;
        }

        replace_components(conn, recipe.id, &update.ingredients, update.tags.as_deref())?;

        if image_id.is_some() {
            delete_if_orphaned(conn, recipe.image_id)?;
        }
        Ok(())
    })?;

    tracing::info!(user_id = user.id, recipe_id = recipe.id, "Updated recipe");

    let response = load_recipe(&mut conn, Some(user.id), recipe.id, &config.public_url)?;
    Ok(Json(response))
}

use super::detail::{load_recipe, RecipeResponse};
use super::write::{check_references, replace_components, validate_create, RecipeWriteRequest};
use crate::api::media::store_image;
use crate::api::{ApiError, ApiJson, ApiResult, ErrorResponse, ValidationErrorResponse};
use crate::auth::AuthUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::models::NewRecipe;
use crate::schema::recipes;
use axum::{extract::State, http::StatusCode, Json};
use diesel::prelude::*;
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/api/recipes",
    tag = "recipes",
    request_body(content = RecipeWriteRequest, example = json!({
        "ingredients": [{"id": 1123, "amount": 10}],
        "tags": [1, 2],
        "image": "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABAgMAAABieywaAAAACVBMVEUAAAD///9fX1/S0ecCAAAACXBIWXMAAA7EAAAOxAGVKw4bAAAACklEQVQImWNoAAAAggCByxOyYQAAAABJRU5ErkJggg==",
        "name": "string",
        "text": "string",
        "cooking_time": 1
    })),
    responses(
        (status = 201, description = "Recipe created", body = RecipeResponse),
        (status = 400, description = "Invalid fields", body = ValidationErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_recipe(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    ApiJson(req): ApiJson<RecipeWriteRequest>,
) -> ApiResult<(StatusCode, Json<RecipeResponse>)> {
    let data = validate_create(&req)?;

    let mut conn = pool.get()?;
    let recipe_id = conn.transaction::<_, ApiError, _>(|conn| {
        check_references(conn, &data.ingredients, Some(data.tags.as_slice()))?;
        let image_id = store_image(conn, &data.image)?;

        let recipe_id: i32 = diesel::insert_into(recipes::table)
            .values(NewRecipe {
                author_id: user.id,
                name: data.name,
                image_id,
                text: data.text,
                cooking_time: data.cooking_time,
            })
            .returning(recipes::id)
            .get_result(conn)?;

        replace_components(conn, recipe_id, &data.ingredients, Some(data.tags.as_slice()))?;
        Ok(recipe_id)
    })?;

    tracing::info!(user_id = user.id, recipe_id, "Created recipe");

    let recipe = load_recipe(&mut conn, Some(user.id), recipe_id, &config.public_url)?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

use crate::api::{ApiResult, ErrorResponse, ObjectId};
use crate::config::Config;
use crate::db::DbPool;
use crate::schema::recipes;
use axum::{extract::State, Json};
use diesel::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ShortLinkResponse {
    #[serde(rename = "short-link")]
    pub short_link: String,
}

pub fn short_link(base_url: &str, recipe_id: i32) -> String {
    format!("{}/recipes/{}/", base_url, recipe_id)
}

#[utoipa::path(
    get,
    path = "/api/recipes/{id}/get-link",
    tag = "recipes",
    params(
        ("id" = i32, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Shareable link to the recipe page", body = ShortLinkResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    )
)]
pub async fn get_link(
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    ObjectId(id): ObjectId,
) -> ApiResult<Json<ShortLinkResponse>> {
    let mut conn = pool.get()?;
    let recipe_id: i32 = recipes::table
        .find(id)
        .select(recipes::id)
        .first(&mut conn)?;

    Ok(Json(ShortLinkResponse {
        short_link: short_link(&config.public_url, recipe_id),
    }))
}

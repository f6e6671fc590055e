use crate::api::ApiResult;
use crate::db::DbPool;
use crate::models::Tag;
use crate::schema::tags;
use axum::{extract::State, Json};
use diesel::prelude::*;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/tags",
    tag = "tags",
    operation_id = "list_tags",
    responses(
        (status = 200, description = "All tags ordered by name", body = Vec<Tag>)
    )
)]
pub async fn list_tags(State(pool): State<Arc<DbPool>>) -> ApiResult<Json<Vec<Tag>>> {
    let mut conn = pool.get()?;

    let tags: Vec<Tag> = tags::table
        .order((tags::name.asc(), tags::id.asc()))
        .select(Tag::as_select())
        .load(&mut conn)?;

    Ok(Json(tags))
}

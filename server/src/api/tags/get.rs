use crate::api::{ApiResult, ErrorResponse, ObjectId};
use crate::db::DbPool;
use crate::models::Tag;
use crate::schema::tags;
use axum::{extract::State, Json};
use diesel::prelude::*;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/tags/{id}",
    tag = "tags",
    params(
        ("id" = i32, Path, description = "Tag ID")
    ),
    responses(
        (status = 200, description = "Tag", body = Tag),
        (status = 404, description = "Tag not found", body = ErrorResponse)
    )
)]
pub async fn get_tag(
    State(pool): State<Arc<DbPool>>,
    ObjectId(id): ObjectId,
) -> ApiResult<Json<Tag>> {
    let mut conn = pool.get()?;

    let tag = tags::table
        .find(id)
        .select(Tag::as_select())
        .first(&mut conn)?;

    Ok(Json(tag))
}

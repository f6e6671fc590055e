use crate::api::{ApiResult, ErrorResponse};
use crate::db::DbPool;
use crate::models::Image;
use crate::schema::images;
use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/media/images/{id}",
    tag = "media",
    params(
        ("id" = Uuid, Path, description = "Image ID")
    ),
    responses(
        (status = 200, description = "Image bytes", content_type = "image/*"),
        (status = 404, description = "Image not found", body = ErrorResponse)
    )
)]
pub async fn get_image(
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let mut conn = pool.get()?;

    let image: Image = images::table
        .find(id)
        .select(Image::as_select())
        .first(&mut conn)?;

    Ok((
        [
            (header::CONTENT_TYPE, image.content_type),
            (
                header::CACHE_CONTROL,
                "public, max-age=31536000, immutable".to_string(),
            ),
        ],
        image.data,
    ))
}

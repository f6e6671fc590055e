pub mod get;

use crate::models::NewImage;
use crate::schema::{images, recipes, users};
use crate::AppState;
use axum::routing::get;
use axum::Router;
use diesel::dsl::{exists, not};
use diesel::prelude::*;
use foodgram_core::DecodedImage;
use utoipa::OpenApi;
use uuid::Uuid;

/// Returns the router for /media endpoints (mounted at /media)
pub fn router() -> Router<AppState> {
    Router::new().route("/images/{id}", get(get::get_image))
}

#[derive(OpenApi)]
#[openapi(paths(get::get_image))]
pub struct ApiDoc;

/// Absolute URL under which an image is served.
pub fn image_url(base_url: &str, id: Uuid) -> String {
    format!("{}/media/images/{}", base_url, id)
}

pub fn store_image(conn: &mut PgConnection, image: &DecodedImage) -> QueryResult<Uuid> {
    diesel::insert_into(images::table)
        .values(NewImage {
            content_type: &image.content_type,
            data: &image.data,
        })
        .returning(images::id)
        .get_result(conn)
}

/// Delete an image once no recipe or avatar points at it.
pub fn delete_if_orphaned(conn: &mut PgConnection, id: Uuid) -> QueryResult<bool> {
    let deleted = diesel::delete(
        images::table
            .filter(images::id.eq(id))
            .filter(not(exists(recipes::table.filter(recipes::image_id.eq(id)))))
            .filter(not(exists(users::table.filter(users::avatar_id.eq(id))))),
    )
    .execute(conn)?;

    if deleted > 0 {
        tracing::debug!(image_id = %id, "Deleted orphaned image");
    }
    Ok(deleted > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_url() {
        let id = Uuid::nil();
        assert_eq!(
            image_url("https://foodgram.example.com", id),
            "https://foodgram.example.com/media/images/00000000-0000-0000-0000-000000000000"
        );
    }
}

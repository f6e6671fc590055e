pub mod collection;
pub mod create;
pub mod delete;
pub mod detail;
pub mod download;
pub mod favorite;
pub mod get;
pub mod get_link;
pub mod list;
pub mod shopping_cart;
pub mod update;
pub mod write;

use crate::AppState;
use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /api/recipes endpoints (mounted at /api/recipes)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list::list_recipes).post(create::create_recipe))
        .route(
            "/download_shopping_cart",
            get(download::download_shopping_cart),
        )
        .route(
            "/{id}",
            get(get::get_recipe)
                .patch(update::update_recipe)
                .delete(delete::delete_recipe),
        )
        .route(
            "/{id}/favorite",
            post(favorite::add_favorite).delete(favorite::remove_favorite),
        )
        .route(
            "/{id}/shopping_cart",
            post(shopping_cart::add_to_cart).delete(shopping_cart::remove_from_cart),
        )
        .route("/{id}/get-link", get(get_link::get_link))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list::list_recipes,
        create::create_recipe,
        get::get_recipe,
        update::update_recipe,
        delete::delete_recipe,
        favorite::add_favorite,
        favorite::remove_favorite,
        shopping_cart::add_to_cart,
        shopping_cart::remove_from_cart,
        download::download_shopping_cart,
        get_link::get_link,
    ),
    components(schemas(
        detail::RecipeResponse,
        detail::RecipeIngredientResponse,
        detail::RecipeMinified,
        write::RecipeWriteRequest,
        write::IngredientAmount,
        get_link::ShortLinkResponse,
    ))
)]
pub struct ApiDoc;

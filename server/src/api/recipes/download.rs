use crate::api::{ApiError, ApiResult, ErrorResponse, RuleErrorResponse};
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::schema::{ingredients, recipe_ingredients, shopping_carts};
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use diesel::prelude::*;
use foodgram_core::shopping_list::FILENAME;
use foodgram_core::{CartLine, ShoppingList};
use std::sync::Arc;

const EMPTY_CART: &str = "Ваш список покупок пуст.";

fn cart_lines(conn: &mut PgConnection, user_id: i32) -> QueryResult<Vec<CartLine>> {
    let rows: Vec<(String, String, i16)> = shopping_carts::table
        .inner_join(
            recipe_ingredients::table
                .on(recipe_ingredients::recipe_id.eq(shopping_carts::recipe_id)),
        )
        .inner_join(ingredients::table.on(ingredients::id.eq(recipe_ingredients::ingredient_id)))
        .filter(shopping_carts::user_id.eq(user_id))
        .select((
            ingredients::name,
            ingredients::measurement_unit,
            recipe_ingredients::amount,
        ))
        .load(conn)?;

    Ok(rows
        .into_iter()
        .map(|(name, measurement_unit, amount)| CartLine {
            name,
            measurement_unit,
            amount: i64::from(amount),
        })
        .collect())
}

#[utoipa::path(
    get,
    path = "/api/recipes/download_shopping_cart",
    tag = "recipes",
    responses(
        (status = 200, description = "Shopping list", content_type = "text/plain", body = String),
        (status = 400, description = "Shopping cart is empty", body = RuleErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn download_shopping_cart(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
) -> ApiResult<Response> {
    let mut conn = pool.get()?;

    let list = ShoppingList::aggregate(cart_lines(&mut conn, user.id)?);
    if list.is_empty() {
        return Err(ApiError::bad_request(EMPTY_CART));
    }

    tracing::debug!(user_id = user.id, items = list.items().len(), "Rendering shopping list");

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", FILENAME),
            ),
        ],
        list.render(),
    )
        .into_response())
}

use crate::api::ApiResult;
use crate::db::DbPool;
use crate::models::Ingredient;
use crate::schema::ingredients;
use axum::{
    extract::{Query, State},
    Json,
};
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListIngredientsParams {
    /// Case-insensitive name prefix
    pub name: Option<String>,
}

/// `LIKE` pattern matching names that start with `prefix`.
///
/// Case is left alone; [`crate::ingredient_name_like`] lowers both sides.
fn prefix_pattern(prefix: &str) -> String {
    let escaped = prefix
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("{}%", escaped)
}

#[utoipa::path(
    get,
    path = "/api/ingredients",
    tag = "ingredients",
    params(ListIngredientsParams),
    responses(
        (status = 200, description = "Ingredients ordered by name", body = Vec<Ingredient>)
    )
)]
pub async fn list_ingredients(
    State(pool): State<Arc<DbPool>>,
    Query(params): Query<ListIngredientsParams>,
) -> ApiResult<Json<Vec<Ingredient>>> {
    let mut conn = pool.get()?;

    let mut query = ingredients::table.into_boxed();
    if let Some(prefix) = params.name.as_deref().filter(|p| !p.is_empty()) {
        query = query.filter(crate::ingredient_name_like!(prefix_pattern(prefix)));
    }

    let ingredients: Vec<Ingredient> = query
        .order((ingredients::name.asc(), ingredients::id.asc()))
        .select(Ingredient::as_select())
        .load(&mut conn)?;

    Ok(Json(ingredients))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_pattern_keeps_case() {
        assert_eq!(prefix_pattern("Сах"), "Сах%");
    }

    #[test]
    fn test_prefix_pattern_escapes_wildcards() {
        assert_eq!(prefix_pattern("100%_"), "100\\%\\_%");
        assert_eq!(prefix_pattern("a\\b"), "a\\\\b%");
    }
}

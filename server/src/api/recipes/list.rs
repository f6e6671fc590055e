use super::detail::{load_recipes, RecipeResponse};
use crate::api::pagination::paginate;
use crate::api::{ApiResult, ErrorResponse, ListQuery, Page, ValidationErrorResponse};
use crate::auth::MaybeAuthUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::models::Recipe;
use crate::schema::{favorites, recipe_tags, recipes, shopping_carts, tags, users};
use axum::{extract::State, Json};
use diesel::pg::Pg;
use diesel::prelude::*;
use foodgram_core::filters::{unknown_tag, UNKNOWN_CHOICE};
use foodgram_core::{FieldErrors, RecipeFilter, RecipeOrdering};
use std::sync::Arc;

/// Reject tag slugs and an author id that do not exist.
fn check_choices(conn: &mut PgConnection, filter: &RecipeFilter) -> ApiResult<()> {
    let mut errors = FieldErrors::new();

    if !filter.tags.is_empty() {
        let known: Vec<String> = tags::table
            .filter(tags::slug.eq_any(&filter.tags))
            .select(tags::slug)
            .load(conn)?;
        if let Some(slug) = filter.tags.iter().find(|slug| !known.contains(slug)) {
            errors.add("tags", unknown_tag(slug));
        }
    }

    if let Some(author) = filter.author {
        let exists: bool =
            diesel::select(diesel::dsl::exists(users::table.find(author))).get_result(conn)?;
        if !exists {
            errors.add("author", UNKNOWN_CHOICE);
        }
    }

    errors.into_result()?;
    Ok(())
}

/// Recipes matching `filter`. Favorite and cart filters only apply with a viewer.
fn filtered(filter: &RecipeFilter, viewer: Option<i32>) -> recipes::BoxedQuery<'static, Pg> {
    let mut query = recipes::table.into_boxed();

    if !filter.tags.is_empty() {
        query = query.filter(
            recipes::id.eq_any(
                recipe_tags::table
                    .inner_join(tags::table)
                    .filter(tags::slug.eq_any(filter.tags.clone()))
                    .select(recipe_tags::recipe_id),
            ),
        );
    }

    if let Some(author) = filter.author {
        query = query.filter(recipes::author_id.eq(author));
    }

    if let Some(viewer) = viewer {
        let favorited = favorites::table
            .filter(favorites::user_id.eq(viewer))
            .select(favorites::recipe_id);
        query = match filter.is_favorited {
            Some(true) => query.filter(recipes::id.eq_any(favorited)),
            Some(false) => query.filter(recipes::id.ne_all(favorited)),
            None => query,
        };

        let in_cart = shopping_carts::table
            .filter(shopping_carts::user_id.eq(viewer))
            .select(shopping_carts::recipe_id);
        query = match filter.is_in_shopping_cart {
            Some(true) => query.filter(recipes::id.eq_any(in_cart)),
            Some(false) => query.filter(recipes::id.ne_all(in_cart)),
            None => query,
        };
    }

    query
}

#[utoipa::path(
    get,
    path = "/api/recipes",
    tag = "recipes",
    params(
        ("page" = Option<i64>, Query, description = "1-based page number"),
        ("limit" = Option<i64>, Query, description = "Page size (default 6, max 1000)"),
        ("tags" = Option<Vec<String>>, Query, description = "Tag slugs, repeatable; any match"),
        ("author" = Option<i32>, Query, description = "Author ID"),
        ("is_favorited" = Option<bool>, Query, description = "1 or 0; other values are ignored"),
        ("is_in_shopping_cart" = Option<bool>, Query, description = "1 or 0; other values are ignored"),
        ("ordering" = Option<String>, Query, description = "pub_date, -pub_date (default), name or -name")
    ),
    responses(
        (status = 200, description = "Recipes", body = Page<RecipeResponse>),
        (status = 400, description = "Unknown tag or author", body = ValidationErrorResponse),
        (status = 404, description = "Invalid page", body = ErrorResponse)
    )
)]
pub async fn list_recipes(
    viewer: MaybeAuthUser,
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    query: ListQuery,
) -> ApiResult<Json<Page<RecipeResponse>>> {
    let filter = RecipeFilter::from_params(&query.params)?;
    let viewer = viewer.id();

    let mut conn = pool.get()?;
    check_choices(&mut conn, &filter)?;

    let (page, count) = paginate(&query, &mut conn, |conn| {
        filtered(&filter, viewer).count().get_result(conn)
    })?;

    let ordered = filtered(&filter, viewer);
    let ordered = match filter.ordering {
        RecipeOrdering::NewestFirst => {
            ordered.order((recipes::pub_date.desc(), recipes::id.desc()))
        }
        RecipeOrdering::OldestFirst => ordered.order((recipes::pub_date.asc(), recipes::id.asc())),
        RecipeOrdering::NameAsc => ordered.order((recipes::name.asc(), recipes::id.asc())),
        RecipeOrdering::NameDesc => ordered.order((recipes::name.desc(), recipes::id.desc())),
    };

    let rows: Vec<Recipe> = ordered
        .select(Recipe::as_select())
        .limit(page.limit)
        .offset(page.offset())
        .load(&mut conn)?;

    let results = load_recipes(&mut conn, viewer, rows, &config.public_url)?;
    Ok(Json(Page::new(results, count, page, &config.public_url, &query)))
}

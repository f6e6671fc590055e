use crate::api::media::image_url;
use crate::api::users::profile::{load_profiles, UserResponse};
use crate::api::{ApiError, ApiResult};
use crate::models::{Recipe, Tag, User};
use crate::schema::{
    favorites, ingredients, recipe_ingredients, recipe_tags, recipes, shopping_carts, tags, users,
};
use diesel::prelude::*;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeIngredientResponse {
    /// Ingredient ID
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i16,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeResponse {
    pub id: i32,
    pub tags: Vec<Tag>,
    pub author: UserResponse,
    pub ingredients: Vec<RecipeIngredientResponse>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    /// Absolute image URL
    pub image: String,
    pub text: String,
    /// Minutes
    pub cooking_time: i16,
}

/// Short recipe form used in favorites, cart and subscription responses
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeMinified {
    pub id: i32,
    pub name: String,
    pub image: String,
    pub cooking_time: i16,
}

impl RecipeMinified {
    pub fn new(recipe: &Recipe, base_url: &str) -> Self {
        RecipeMinified {
            id: recipe.id,
            name: recipe.name.clone(),
            image: image_url(base_url, recipe.image_id),
            cooking_time: recipe.cooking_time,
        }
    }
}

type IngredientRow = (i32, i32, String, String, i16);

fn viewer_recipe_sets(
    conn: &mut PgConnection,
    viewer: Option<i32>,
    ids: &[i32],
) -> QueryResult<(HashSet<i32>, HashSet<i32>)> {
    let Some(viewer) = viewer else {
        return Ok((HashSet::new(), HashSet::new()));
    };

    let favorited: Vec<i32> = favorites::table
        .filter(favorites::user_id.eq(viewer))
        .filter(favorites::recipe_id.eq_any(ids))
        .select(favorites::recipe_id)
        .load(conn)?;

    let in_cart: Vec<i32> = shopping_carts::table
        .filter(shopping_carts::user_id.eq(viewer))
        .filter(shopping_carts::recipe_id.eq_any(ids))
        .select(shopping_carts::recipe_id)
        .load(conn)?;

    Ok((favorited.into_iter().collect(), in_cart.into_iter().collect()))
}

/// Expand recipe rows into full responses for `viewer`, keeping their order.
///
/// Runs a fixed number of queries regardless of how many recipes are passed.
pub fn load_recipes(
    conn: &mut PgConnection,
    viewer: Option<i32>,
    recipes: Vec<Recipe>,
    base_url: &str,
) -> QueryResult<Vec<RecipeResponse>> {
    if recipes.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i32> = recipes.iter().map(|r| r.id).collect();

    let mut tags_by_recipe: HashMap<i32, Vec<Tag>> = HashMap::new();
    let tag_rows: Vec<(i32, Tag)> = recipe_tags::table
        .inner_join(tags::table)
        .filter(recipe_tags::recipe_id.eq_any(&ids))
        .order(tags::name.asc())
        .select((recipe_tags::recipe_id, Tag::as_select()))
        .load(conn)?;
    for (recipe_id, tag) in tag_rows {
        tags_by_recipe.entry(recipe_id).or_default().push(tag);
    }

    let mut ingredients_by_recipe: HashMap<i32, Vec<RecipeIngredientResponse>> = HashMap::new();
    let ingredient_rows: Vec<IngredientRow> = recipe_ingredients::table
        .inner_join(ingredients::table)
        .filter(recipe_ingredients::recipe_id.eq_any(&ids))
        .order(recipe_ingredients::id.asc())
        .select((
            recipe_ingredients::recipe_id,
            ingredients::id,
            ingredients::name,
            ingredients::measurement_unit,
            recipe_ingredients::amount,
        ))
        .load(conn)?;
    for (recipe_id, id, name, measurement_unit, amount) in ingredient_rows {
        ingredients_by_recipe
            .entry(recipe_id)
            .or_default()
            .push(RecipeIngredientResponse {
                id,
                name,
                measurement_unit,
                amount,
            });
    }

    let mut author_ids: Vec<i32> = recipes.iter().map(|r| r.author_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();
    let authors: Vec<User> = users::table
        .filter(users::id.eq_any(&author_ids))
        .select(User::as_select())
        .load(conn)?;
    let authors: HashMap<i32, UserResponse> = load_profiles(conn, viewer, authors, base_url)?
        .into_iter()
        .map(|profile| (profile.id, profile))
        .collect();

    let (favorited, in_cart) = viewer_recipe_sets(conn, viewer, &ids)?;

    recipes
        .into_iter()
        .map(|recipe| {
            let author = authors
                .get(&recipe.author_id)
                .cloned()
                .ok_or(diesel::result::Error::NotFound)?;
            Ok(RecipeResponse {
                tags: tags_by_recipe.remove(&recipe.id).unwrap_or_default(),
                ingredients: ingredients_by_recipe.remove(&recipe.id).unwrap_or_default(),
                is_favorited: favorited.contains(&recipe.id),
                is_in_shopping_cart: in_cart.contains(&recipe.id),
                image: image_url(base_url, recipe.image_id),
                author,
                id: recipe.id,
                name: recipe.name,
                text: recipe.text,
                cooking_time: recipe.cooking_time,
            })
        })
        .collect()
}

pub fn find_recipe(conn: &mut PgConnection, id: i32) -> QueryResult<Recipe> {
    recipes::table
        .find(id)
        .select(Recipe::as_select())
        .first(conn)
}

/// Load one recipe as a full response; unknown ids are a 404.
pub fn load_recipe(
    conn: &mut PgConnection,
    viewer: Option<i32>,
    id: i32,
    base_url: &str,
) -> ApiResult<RecipeResponse> {
    let recipe = find_recipe(conn, id)?;
    let mut loaded = load_recipes(conn, viewer, vec![recipe], base_url)?;
    loaded.pop().ok_or(ApiError::NotFound)
}

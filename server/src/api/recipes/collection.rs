//! Per-user recipe collections: favorites and the shopping cart.
//!
//! Both share one flow. Adding twice or removing a recipe that was never added is a 400
//! with a collection-specific message.

use super::detail::{find_recipe, RecipeMinified};
use crate::api::{ApiError, ApiResult};
use crate::config::Config;
use crate::db::DbPool;
use crate::models::{NewFavorite, NewShoppingCartEntry, User};
use crate::schema::{favorites, shopping_carts};
use axum::{http::StatusCode, Json};
use diesel::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeCollection {
    Favorites,
    ShoppingCart,
}

impl RecipeCollection {
    pub fn already_added(self) -> &'static str {
        match self {
            RecipeCollection::Favorites => "Рецепт уже в избранном.",
            RecipeCollection::ShoppingCart => "Рецепт уже в списке покупок.",
        }
    }

    pub fn not_added(self) -> &'static str {
        match self {
            RecipeCollection::Favorites => "Рецепта не было в избранном.",
            RecipeCollection::ShoppingCart => "Рецепта не было в списке покупок.",
        }
    }

    /// Insert the pair, returning false when it was already there.
    fn insert(self, conn: &mut PgConnection, user_id: i32, recipe_id: i32) -> QueryResult<bool> {
        let inserted = match self {
            RecipeCollection::Favorites => diesel::insert_into(favorites::table)
                .values(NewFavorite { user_id, recipe_id })
                .on_conflict_do_nothing()
                .execute(conn)?,
            RecipeCollection::ShoppingCart => diesel::insert_into(shopping_carts::table)
                .values(NewShoppingCartEntry { user_id, recipe_id })
                .on_conflict_do_nothing()
                .execute(conn)?,
        };
        Ok(inserted > 0)
    }

    /// Delete the pair, returning false when there was nothing to delete.
    fn delete(self, conn: &mut PgConnection, user_id: i32, recipe_id: i32) -> QueryResult<bool> {
        let deleted = match self {
            RecipeCollection::Favorites => diesel::delete(
                favorites::table
                    .filter(favorites::user_id.eq(user_id))
                    .filter(favorites::recipe_id.eq(recipe_id)),
            )
            .execute(conn)?,
            RecipeCollection::ShoppingCart => diesel::delete(
                shopping_carts::table
                    .filter(shopping_carts::user_id.eq(user_id))
                    .filter(shopping_carts::recipe_id.eq(recipe_id)),
            )
            .execute(conn)?,
        };
        Ok(deleted > 0)
    }

    pub fn add(
        self,
        pool: &DbPool,
        config: &Config,
        user: &User,
        recipe_id: i32,
    ) -> ApiResult<(StatusCode, Json<RecipeMinified>)> {
        let mut conn = pool.get()?;
        let recipe = find_recipe(&mut conn, recipe_id)?;

        if !self.insert(&mut conn, user.id, recipe.id)? {
            return Err(ApiError::bad_request(self.already_added()));
        }

        Ok((
            StatusCode::CREATED,
            Json(RecipeMinified::new(&recipe, &config.public_url)),
        ))
    }

    pub fn remove(self, pool: &DbPool, user: &User, recipe_id: i32) -> ApiResult<StatusCode> {
        let mut conn = pool.get()?;
        let recipe = find_recipe(&mut conn, recipe_id)?;

        if !self.delete(&mut conn, user.id, recipe.id)? {
            return Err(ApiError::bad_request(self.not_added()));
        }
        Ok(StatusCode::NO_CONTENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_collection() {
        let favorites = RecipeCollection::Favorites;
        let cart = RecipeCollection::ShoppingCart;
        assert!(favorites.already_added().contains("избранном"));
        assert!(favorites.not_added().contains("избранном"));
        assert!(cart.already_added().contains("списке покупок"));
        assert!(cart.not_added().contains("списке покупок"));
        assert_ne!(favorites.already_added(), favorites.not_added());
    }
}

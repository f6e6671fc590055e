//! Request body shared by recipe create and update, plus the helpers that
//! check it against the database and store ingredient and tag links.

use crate::api::ApiResult;
use crate::models::{NewRecipeIngredient, NewRecipeTag};
use crate::schema::{ingredients, recipe_ingredients, recipe_tags, tags};
use diesel::prelude::*;
use foodgram_core::validation::{
    first_duplicate, max_length, positive_small_int, required_text, MAX_RECIPE_NAME_LENGTH,
    REQUIRED,
};
use foodgram_core::{decode_data_uri, DecodedImage, FieldErrors};
use serde::Deserialize;
use utoipa::ToSchema;

const NO_INGREDIENTS: &str = "Нужен хотя бы один ингредиент.";
const DUPLICATE_INGREDIENTS: &str = "Ингредиенты не должны повторяться.";
const DUPLICATE_TAGS: &str = "Теги не должны повторяться.";
const AMOUNT_TOO_SMALL: &str = "Количество ингредиента не может быть меньше 1.";
const COOKING_TIME_TOO_SMALL: &str = "Время приготовления должно быть не меньше 1.";

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct IngredientAmount {
    /// Ingredient ID
    pub id: i32,
    pub amount: i64,
}

/// Body of `POST /api/recipes` and `PATCH /api/recipes/{id}`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RecipeWriteRequest {
    pub ingredients: Option<Vec<IngredientAmount>>,
    /// Tag IDs
    pub tags: Option<Vec<i32>>,
    /// `data:image/<ext>;base64,<payload>`
    pub image: Option<String>,
    pub name: Option<String>,
    pub text: Option<String>,
    /// Minutes
    pub cooking_time: Option<i64>,
}

/// (ingredient id, amount)
pub type IngredientLine = (i32, i16);

#[derive(Debug)]
pub struct NewRecipeData<'a> {
    pub ingredients: Vec<IngredientLine>,
    pub tags: Vec<i32>,
    pub image: DecodedImage,
    pub name: &'a str,
    pub text: &'a str,
    pub cooking_time: i16,
}

/// A validated PATCH. Ingredients are always replaced; `None` fields stay as they are.
#[derive(Debug)]
pub struct RecipeUpdate<'a> {
    pub ingredients: Vec<IngredientLine>,
    pub tags: Option<Vec<i32>>,
    pub image: Option<DecodedImage>,
    pub name: Option<&'a str>,
    pub text: Option<&'a str>,
    pub cooking_time: Option<i16>,
}

struct Checked<'a> {
    errors: FieldErrors,
    ingredients: Option<Vec<IngredientLine>>,
    tags: Option<Vec<i32>>,
    image: Option<DecodedImage>,
    name: Option<&'a str>,
    text: Option<&'a str>,
    cooking_time: Option<i16>,
}

fn check_ingredients(
    errors: &mut FieldErrors,
    items: Option<&[IngredientAmount]>,
) -> Option<Vec<IngredientLine>> {
    let Some(items) = items else {
        errors.add("ingredients", REQUIRED);
        return None;
    };
    if items.is_empty() {
        errors.add("ingredients", NO_INGREDIENTS);
        return None;
    }

    let ids: Vec<i32> = items.iter().map(|item| item.id).collect();
    if first_duplicate(&ids).is_some() {
        errors.add("ingredients", DUPLICATE_INGREDIENTS);
        return None;
    }

    let mut lines = Vec::with_capacity(items.len());
    for item in items {
        if item.amount < 1 {
            errors.add("ingredients", AMOUNT_TOO_SMALL);
            return None;
        }
        match positive_small_int(item.amount) {
            Ok(amount) => lines.push((item.id, amount)),
            Err(message) => {
                errors.add("ingredients", message);
                return None;
            }
        }
    }
    Some(lines)
}

fn check_cooking_time(errors: &mut FieldErrors, value: i64) -> Option<i16> {
    if value < 1 {
        errors.add("cooking_time", COOKING_TIME_TOO_SMALL);
        return None;
    }
    positive_small_int(value)
        .map_err(|message| errors.add("cooking_time", message))
        .ok()
}

/// Field checks shared by create and update. With `partial`, absent fields are skipped
/// instead of reported, except `ingredients`, which is always required.
fn check(req: &RecipeWriteRequest, partial: bool) -> Checked<'_> {
    let mut errors = FieldErrors::new();

    let ingredients = check_ingredients(&mut errors, req.ingredients.as_deref());

    let tags = match req.tags.as_deref() {
        None if partial => None,
        None => Some(Vec::new()),
        Some(tags) if first_duplicate(tags).is_some() => {
            errors.add("tags", DUPLICATE_TAGS);
            None
        }
        Some(tags) => Some(tags.to_vec()),
    };

    let image = if partial && req.image.is_none() {
        None
    } else {
        required_text(&mut errors, "image", req.image.as_deref()).and_then(|raw| {
            decode_data_uri(raw)
                .map_err(|e| errors.add("image", e.to_string()))
                .ok()
        })
    };

    let name = if partial && req.name.is_none() {
        None
    } else {
        required_text(&mut errors, "name", req.name.as_deref())
            .filter(|name| max_length(&mut errors, "name", name, MAX_RECIPE_NAME_LENGTH))
    };

    let text = if partial && req.text.is_none() {
        None
    } else {
        required_text(&mut errors, "text", req.text.as_deref())
    };

    let cooking_time = match req.cooking_time {
        None if partial => None,
        None => {
            errors.add("cooking_time", REQUIRED);
            None
        }
        Some(value) => check_cooking_time(&mut errors, value),
    };

    Checked {
        errors,
        ingredients,
        tags,
        image,
        name,
        text,
        cooking_time,
    }
}

pub fn validate_create(req: &RecipeWriteRequest) -> Result<NewRecipeData<'_>, FieldErrors> {
    let Checked {
        errors,
        ingredients,
        tags,
        image,
        name,
        text,
        cooking_time,
    } = check(req, false);

    match (ingredients, tags, image, name, text, cooking_time) {
        (Some(ingredients), Some(tags), Some(image), Some(name), Some(text), Some(cooking_time))
            if errors.is_empty() =>
        {
            Ok(NewRecipeData {
                ingredients,
                tags,
                image,
                name,
                text,
                cooking_time,
            })
        }
        _ => Err(errors),
    }
}

pub fn validate_update(req: &RecipeWriteRequest) -> Result<RecipeUpdate<'_>, FieldErrors> {
    let Checked {
        errors,
        ingredients,
        tags,
        image,
        name,
        text,
        cooking_time,
    } = check(req, true);

    match ingredients {
        Some(ingredients) if errors.is_empty() => Ok(RecipeUpdate {
            ingredients,
            tags,
            image,
            name,
            text,
            cooking_time,
        }),
        _ => Err(errors),
    }
}

/// Reject ingredient and tag ids that do not exist.
pub fn check_references(
    conn: &mut PgConnection,
    lines: &[IngredientLine],
    tag_ids: Option<&[i32]>,
) -> ApiResult<()> {
    let mut errors = FieldErrors::new();

    let wanted: Vec<i32> = lines.iter().map(|(id, _)| *id).collect();
    let found: Vec<i32> = ingredients::table
        .filter(ingredients::id.eq_any(&wanted))
        .select(ingredients::id)
        .load(conn)?;
    for id in wanted.iter().filter(|id| !found.contains(id)) {
        errors.add(
            "ingredients",
            format!("Invalid pk \"{}\" - object does not exist.", id),
        );
    }

    if let Some(tag_ids) = tag_ids {
        let found: Vec<i32> = tags::table
            .filter(tags::id.eq_any(tag_ids))
            .select(tags::id)
            .load(conn)?;
        for id in tag_ids.iter().filter(|id| !found.contains(id)) {
            errors.add("tags", format!("Invalid pk \"{}\" - object does not exist.", id));
        }
    }

    errors.into_result()?;
    Ok(())
}

/// Replace the recipe's ingredient lines, and its tags when `tag_ids` is given.
pub fn replace_components(
    conn: &mut PgConnection,
    recipe_id: i32,
    lines: &[IngredientLine],
    tag_ids: Option<&[i32]>,
) -> QueryResult<()> {
    diesel::delete(recipe_ingredients::table.filter(recipe_ingredients::recipe_id.eq(recipe_id)))
        .execute(conn)?;
    let rows: Vec<NewRecipeIngredient> = lines
        .iter()
        .map(|&(ingredient_id, amount)| NewRecipeIngredient {
            recipe_id,
            ingredient_id,
            amount,
        })
        .collect();
    diesel::insert_into(recipe_ingredients::table)
        .values(&rows)
        .execute(conn)?;

    if let Some(tag_ids) = tag_ids {
        diesel::delete(recipe_tags::table.filter(recipe_tags::recipe_id.eq(recipe_id)))
            .execute(conn)?;
        if !tag_ids.is_empty() {
            let rows: Vec<NewRecipeTag> = tag_ids
                .iter()
                .map(|&tag_id| NewRecipeTag { recipe_id, tag_id })
                .collect();
            diesel::insert_into(recipe_tags::table)
                .values(&rows)
                .execute(conn)?;
        }
    }

    Ok(())
}

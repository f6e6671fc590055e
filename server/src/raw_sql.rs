//! SQL that diesel's DSL does not cover.
//!
//! Request values only reach these fragments through `.bind()`.

/// Case-insensitive prefix match on `ingredients.name`, with `\` as the `LIKE` escape.
///
/// The bound pattern is lowered in SQL as well, so both sides fold under the database locale.
#[macro_export]
macro_rules! ingredient_name_like {
    ($pattern:expr) => {
        diesel::dsl::sql::<diesel::sql_types::Bool>("LOWER(ingredients.name) LIKE LOWER(")
            .bind::<diesel::sql_types::Text, _>($pattern)
            .sql(") ESCAPE '\\'")
    };
}

/// Newest recipes of each author in `$1` (an `int4[]`), at most `$2` per author.
///
/// A NULL `$2` returns every recipe. Rows come back grouped by author, newest first.
pub const RECENT_RECIPES_BY_AUTHOR: &str =
    "SELECT id, author_id, name, image_id, text, cooking_time, pub_date \
    FROM ( \
        SELECT r.*, ROW_NUMBER() OVER ( \
            PARTITION BY r.author_id ORDER BY r.pub_date DESC, r.id DESC \
        ) AS rn \
        FROM recipes r \
        WHERE r.author_id = ANY($1) \
    ) ranked \
    WHERE $2::bigint IS NULL OR rn <= $2 \
    ORDER BY author_id, rn";

//! `load-data`: seed ingredients from a JSON fixture and the default tag set.

use std::path::Path;

use anyhow::{Context, Result};
use diesel::prelude::*;
use foodgram_core::validation::{
    check_color, check_slug, max_length, required_text, MAX_INGREDIENT_FIELD_LENGTH,
    MAX_TAG_FIELD_LENGTH,
};
use foodgram_core::FieldErrors;
use serde::Deserialize;

use crate::db::DbPool;
use crate::models::{NewIngredient, NewTag};
use crate::schema::{ingredients, tags};

// Stays well under the Postgres bind-parameter limit.
const INSERT_CHUNK: usize = 1000;

struct SeedTag {
    name: &'static str,
    color: &'static str,
    slug: &'static str,
}

const DEFAULT_TAGS: &[SeedTag] = &[
    SeedTag {
        name: "Завтрак",
        color: "#E26C2D",
        slug: "breakfast",
    },
    SeedTag {
        name: "Обед",
        color: "#49B64E",
        slug: "lunch",
    },
    SeedTag {
        name: "Ужин",
        color: "#8775D2",
        slug: "dinner",
    },
    SeedTag {
        name: "Перекус",
        color: "#3399FF",
        slug: "snack",
    },
    SeedTag {
        name: "Десерт",
        color: "#FF66CC",
        slug: "dessert",
    },
    SeedTag {
        name: "Выпечка",
        color: "#FFCC66",
        slug: "baking",
    },
    SeedTag {
        name: "Напитки",
        color: "#33CCCC",
        slug: "drinks",
    },
];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub ingredients_created: usize,
    pub ingredients_skipped: usize,
    pub ingredients_invalid: usize,
    pub tags_created: usize,
    pub tags_skipped: usize,
    pub tags_invalid: usize,
}

#[derive(Deserialize)]
struct IngredientRow {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    measurement_unit: Option<String>,
}

/// Ingredient rows from the fixture, split into insertable rows and a count of rejects.
#[derive(Debug, Default)]
pub struct ParsedIngredients {
    pub valid: Vec<NewIngredient>,
    pub invalid: usize,
}

fn check_ingredient(row: &IngredientRow) -> Result<NewIngredient, FieldErrors> {
    let mut errors = FieldErrors::new();
    let name = required_text(&mut errors, "name", row.name.as_deref()).map(str::to_lowercase);
    let unit = required_text(&mut errors, "measurement_unit", row.measurement_unit.as_deref())
        .map(str::to_lowercase);

    if let Some(name) = &name {
        max_length(&mut errors, "name", name, MAX_INGREDIENT_FIELD_LENGTH);
    }
    if let Some(unit) = &unit {
        max_length(&mut errors, "measurement_unit", unit, MAX_INGREDIENT_FIELD_LENGTH);
    }

    match (name, unit) {
        (Some(name), Some(measurement_unit)) if errors.is_empty() => Ok(NewIngredient {
            name,
            measurement_unit,
        }),
        _ => Err(errors),
    }
}

/// Parse a JSON array of `{name, measurement_unit}`.
///
/// Fields are trimmed and lowercased. Rows failing the field checks are logged and counted
/// instead of failing the whole file.
pub fn parse_ingredients(raw: &str) -> Result<ParsedIngredients> {
    let rows: Vec<IngredientRow> = serde_json::from_str(raw)
        .context("ingredient file is not a JSON array of {name, measurement_unit}")?;

    let mut parsed = ParsedIngredients::default();
    for (index, row) in rows.iter().enumerate() {
        match check_ingredient(row) {
            Ok(item) => parsed.valid.push(item),
            Err(errors) => {
                tracing::warn!(row = index, %errors, "Skipping invalid ingredient");
                parsed.invalid += 1;
            }
        }
    }
    Ok(parsed)
}

fn check_tag(tag: &SeedTag) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    max_length(&mut errors, "name", tag.name, MAX_TAG_FIELD_LENGTH);
    max_length(&mut errors, "color", tag.color, MAX_TAG_FIELD_LENGTH);
    max_length(&mut errors, "slug", tag.slug, MAX_TAG_FIELD_LENGTH);
    if let Err(message) = check_color(tag.color) {
        errors.add("color", message);
    }
    if let Err(message) = check_slug(tag.slug) {
        errors.add("slug", message);
    }
    errors.into_result()
}

fn load_ingredients(conn: &mut PgConnection, path: &Path, report: &mut LoadReport) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let parsed = parse_ingredients(&raw)?;
    report.ingredients_invalid = parsed.invalid;

    // Each chunk commits on its own so a failure keeps earlier chunks.
    for (index, chunk) in parsed.valid.chunks(INSERT_CHUNK).enumerate() {
        let created = diesel::insert_into(ingredients::table)
            .values(chunk)
            .on_conflict((ingredients::name, ingredients::measurement_unit))
            .do_nothing()
            .execute(conn)
            .with_context(|| format!("failed to insert ingredient chunk {}", index))?;
        report.ingredients_created += created;
        report.ingredients_skipped += chunk.len() - created;
    }

    tracing::info!(
        created = report.ingredients_created,
        skipped = report.ingredients_skipped,
        errors = report.ingredients_invalid,
        "Loaded ingredients from {}",
        path.display()
    );
    Ok(())
}

fn load_tags(conn: &mut PgConnection, seed: &[SeedTag], report: &mut LoadReport) -> Result<()> {
    for tag in seed {
        if let Err(errors) = check_tag(tag) {
            tracing::warn!(slug = tag.slug, %errors, "Skipping invalid tag");
            report.tags_invalid += 1;
            continue;
        }

        let created = diesel::insert_into(tags::table)
            .values(NewTag {
                name: tag.name,
                color: tag.color,
                slug: tag.slug,
            })
            .on_conflict_do_nothing()
            .execute(conn)
            .with_context(|| format!("failed to create tag {}", tag.slug))?;
        if created == 0 {
            report.tags_skipped += 1;
        } else {
            report.tags_created += 1;
        }
    }

    tracing::info!(
        created = report.tags_created,
        skipped = report.tags_skipped,
        errors = report.tags_invalid,
        "Loaded default tags"
    );
    Ok(())
}

pub fn load_data(
    pool: &DbPool,
    ingredients_path: Option<&Path>,
    skip_tags: bool,
) -> Result<LoadReport> {
    let mut conn = pool.get().context("failed to get DB connection")?;
    let mut report = LoadReport::default();

    if let Some(path) = ingredients_path {
        load_ingredients(&mut conn, path, &mut report)?;
    }

    if skip_tags {
        tracing::info!("Skipping default tags");
    } else {
        load_tags(&mut conn, DEFAULT_TAGS, &mut report)?;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tags_are_valid() {
        for tag in DEFAULT_TAGS {
            assert!(check_tag(tag).is_ok(), "{}", tag.slug);
        }
        let mut colors: Vec<_> = DEFAULT_TAGS.iter().map(|t| t.color).collect();
        colors.sort_unstable();
        colors.dedup();
        assert_eq!(colors.len(), DEFAULT_TAGS.len());
    }

    #[test]
    fn test_bad_tag_is_rejected() {
        let tag = SeedTag {
            name: "Завтрак",
            color: "orange",
            slug: "not a slug",
        };
        let errors = check_tag(&tag).unwrap_err();
        assert!(errors.get("color").is_some());
        assert!(errors.get("slug").is_some());
        assert!(errors.get("name").is_none());
    }

    #[test]
    fn test_parse_ingredients_lowercases_and_trims() {
        let raw = r#"[
            {"name": " Абрикосовое Варенье ", "measurement_unit": "Г"},
            {"name": "соль", "measurement_unit": "по вкусу"}
        ]"#;
        let parsed = parse_ingredients(raw).unwrap();
        assert_eq!(parsed.invalid, 0);
        assert_eq!(parsed.valid[0].name, "абрикосовое варенье");
        assert_eq!(parsed.valid[0].measurement_unit, "г");
        assert_eq!(parsed.valid[1].measurement_unit, "по вкусу");
    }

    #[test]
    fn test_parse_ingredients_counts_bad_rows_and_keeps_good_ones() {
        let too_long = "а".repeat(MAX_INGREDIENT_FIELD_LENGTH + 1);
        let at_limit = "б".repeat(MAX_INGREDIENT_FIELD_LENGTH);
        let raw = serde_json::json!([
            {"name": "мука", "measurement_unit": "г"},
            {"name": "", "measurement_unit": "г"},
            {"measurement_unit": "шт."},
            {"name": "яйца"},
            {"name": too_long, "measurement_unit": "г"},
            {"name": at_limit, "measurement_unit": "кг"},
            {"name": "сахар", "measurement_unit": "   "}
        ])
        .to_string();

        let parsed = parse_ingredients(&raw).unwrap();
        assert_eq!(parsed.invalid, 5);
        let names: Vec<_> = parsed.valid.iter().map(|item| item.name.as_str()).collect();
        assert_eq!(names, vec!["мука", at_limit.as_str()]);
    }

    #[test]
    fn test_parse_ingredients_rejects_other_shapes() {
        assert!(parse_ingredients(r#"{"name": "соль"}"#).is_err());
    }

    #[test]
    fn test_bundled_ingredients_parse() {
        let raw = include_str!("../../data/ingredients.json");
        let parsed = parse_ingredients(raw).unwrap();
        assert!(!parsed.valid.is_empty());
        assert_eq!(parsed.invalid, 0);
    }
}

use crate::query::QueryParams;
use crate::validation::FieldErrors;

pub const UNKNOWN_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// Field error for a `tags` slug with no matching tag.
pub fn unknown_tag(slug: &str) -> String {
    format!(
        "Select a valid choice. {} is not one of the available choices.",
        slug
    )
}

/// Sort order for the recipe list (`?ordering=`).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum RecipeOrdering {
    /// Newest first (`-pub_date`)
    #[default]
    NewestFirst,
    /// `pub_date`
    OldestFirst,
    /// `name`
    NameAsc,
    /// `-name`
    NameDesc,
}

impl RecipeOrdering {
    /// Unknown values fall back to the default ordering.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "pub_date" => Self::OldestFirst,
            "name" => Self::NameAsc,
            "-name" => Self::NameDesc,
            _ => Self::NewestFirst,
        }
    }
}

/// Filters accepted by `GET /api/recipes`.
///
/// Parsing only checks shapes; whether the tags and author exist is checked
/// against the database by the handler.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecipeFilter {
    /// Tag slugs; a recipe matches if it carries any of them.
    pub tags: Vec<String>,
    pub author: Option<i32>,
    /// Only meaningful for authenticated viewers.
    pub is_favorited: Option<bool>,
    /// Only meaningful for authenticated viewers.
    pub is_in_shopping_cart: Option<bool>,
    pub ordering: RecipeOrdering,
}

impl RecipeFilter {
    pub fn from_params(params: &QueryParams) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();

        let tags = params
            .get_all("tags")
            .map(str::trim)
            .filter(|slug| !slug.is_empty())
            .map(str::to_string)
            .collect();

        let author = match params.get("author").map(str::trim) {
            None | Some("") => None,
            Some(raw) => match raw.parse::<i32>() {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.add("author", UNKNOWN_CHOICE);
                    None
                }
            },
        };

        let is_favorited = params.get("is_favorited").and_then(parse_bool);
        let is_in_shopping_cart = params.get("is_in_shopping_cart").and_then(parse_bool);

        let ordering = params
            .get("ordering")
            .map(RecipeOrdering::parse)
            .unwrap_or_default();

        errors.into_result()?;

        Ok(Self {
            tags,
            author,
            is_favorited,
            is_in_shopping_cart,
            ordering,
        })
    }
}

/// Parse `1/0`, `true/false` (any case). Anything else means "not set".
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

/// `?recipes_limit=` on subscription endpoints. Invalid values mean "no limit".
pub fn recipes_limit(params: &QueryParams) -> Option<usize> {
    params
        .get("recipes_limit")
        .and_then(|raw| raw.trim().parse::<usize>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(raw: &str) -> Result<RecipeFilter, FieldErrors> {
        RecipeFilter::from_params(&QueryParams::parse(Some(raw)))
    }

    #[test]
    fn test_empty_filter() {
        assert_eq!(filter("").unwrap(), RecipeFilter::default());
    }

    #[test]
    fn test_full_filter() {
        let parsed =
            filter("tags=lunch&tags=dinner&author=7&is_favorited=1&is_in_shopping_cart=false&ordering=name")
                .unwrap();
        assert_eq!(parsed.tags, vec!["lunch", "dinner"]);
        assert_eq!(parsed.author, Some(7));
        assert_eq!(parsed.is_favorited, Some(true));
        assert_eq!(parsed.is_in_shopping_cart, Some(false));
        assert_eq!(parsed.ordering, RecipeOrdering::NameAsc);
    }

    #[test]
    fn test_blank_values_are_unset() {
        let parsed = filter("tags=&author=&is_favorited=").unwrap();
        assert!(parsed.tags.is_empty());
        assert_eq!(parsed.author, None);
        assert_eq!(parsed.is_favorited, None);
    }

    #[test]
    fn test_non_numeric_author_is_reported() {
        let errors = filter("author=bob").unwrap_err();
        assert_eq!(errors.get("author"), Some(&[UNKNOWN_CHOICE.to_string()][..]));
    }

    #[test]
    fn test_unparsable_booleans_are_ignored() {
        let parsed = filter("is_favorited=maybe&is_in_shopping_cart=2").unwrap();
        assert_eq!(parsed.is_favorited, None);
        assert_eq!(parsed.is_in_shopping_cart, None);
    }

    #[test]
    fn test_unknown_tag_message() {
        assert_eq!(
            unknown_tag("no-such-tag"),
            "Select a valid choice. no-such-tag is not one of the available choices."
        );
    }

    #[test]
    fn test_ordering_values() {
        assert_eq!(RecipeOrdering::parse("-pub_date"), RecipeOrdering::NewestFirst);
        assert_eq!(RecipeOrdering::parse("pub_date"), RecipeOrdering::OldestFirst);
        assert_eq!(RecipeOrdering::parse("-name"), RecipeOrdering::NameDesc);
        assert_eq!(RecipeOrdering::parse("cooking_time"), RecipeOrdering::NewestFirst);
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("True"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("yes"), None);
    }

    #[test]
    fn test_recipes_limit() {
        let params = QueryParams::parse(Some("recipes_limit=3"));
        assert_eq!(recipes_limit(&params), Some(3));
        let params = QueryParams::parse(Some("recipes_limit=-1"));
        assert_eq!(recipes_limit(&params), None);
        assert_eq!(recipes_limit(&QueryParams::default()), None);
    }
}

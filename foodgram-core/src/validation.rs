//! Field-level validation rules shared by request handlers and the data loader.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

pub const MAX_EMAIL_LENGTH: usize = 254;
pub const MAX_USER_NAME_LENGTH: usize = 150;
pub const MAX_RECIPE_NAME_LENGTH: usize = 200;
pub const MAX_TAG_FIELD_LENGTH: usize = 200;
pub const MAX_INGREDIENT_FIELD_LENGTH: usize = 200;

pub const REQUIRED: &str = "This field is required.";
pub const BLANK: &str = "This field may not be blank.";

/// Usernames reserved for routing (`/api/users/me`).
pub const RESERVED_USERNAMES: &[&str] = &["me"];

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").expect("valid username regex"));

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex")
});

static COLOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#([A-Fa-f0-9]{6}|[A-Fa-f0-9]{3})$").expect("valid color regex")
});

static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("valid slug regex"));

/// Validation messages keyed by field name.
///
/// Serializes as `{"field": ["message", ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

/// Require a non-blank string field, recording an error otherwise.
///
/// Returns the trimmed value when present.
pub fn required_text<'a>(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&'a str>,
) -> Option<&'a str> {
    match value.map(str::trim) {
        None => {
            errors.add(field, REQUIRED);
            None
        }
        Some("") => {
            errors.add(field, BLANK);
            None
        }
        Some(v) => Some(v),
    }
}

/// Like [`required_text`] but keeps surrounding whitespace, for passwords.
pub fn required_untrimmed<'a>(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&'a str>,
) -> Option<&'a str> {
    match value {
        None => {
            errors.add(field, REQUIRED);
            None
        }
        Some("") => {
            errors.add(field, BLANK);
            None
        }
        Some(v) => Some(v),
    }
}

/// Record an error when `value` is longer than `max` characters.
pub fn max_length(errors: &mut FieldErrors, field: &str, value: &str, max: usize) -> bool {
    if value.chars().count() > max {
        errors.add(
            field,
            format!("Ensure this field has no more than {} characters.", max),
        );
        false
    } else {
        true
    }
}

pub fn check_email(value: &str) -> Result<(), &'static str> {
    if EMAIL_RE.is_match(value) {
        Ok(())
    } else {
        Err("Enter a valid email address.")
    }
}

pub fn check_username(value: &str) -> Result<(), &'static str> {
    if RESERVED_USERNAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(value))
    {
        return Err("This username is reserved.");
    }
    if USERNAME_RE.is_match(value) {
        Ok(())
    } else {
        Err("Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.")
    }
}

pub fn check_color(value: &str) -> Result<(), &'static str> {
    if COLOR_RE.is_match(value) {
        Ok(())
    } else {
        Err("Enter a valid HEX color (#RRGGBB or #RGB).")
    }
}

pub fn check_slug(value: &str) -> Result<(), &'static str> {
    if SLUG_RE.is_match(value) {
        Ok(())
    } else {
        Err("Enter a valid slug consisting of letters, numbers, underscores or hyphens.")
    }
}

/// Accept values that fit a positive SMALLINT column (1..=32767).
pub fn positive_small_int(value: i64) -> Result<i16, String> {
    if value < 1 {
        return Err("Ensure this value is greater than or equal to 1.".to_string());
    }
    i16::try_from(value).map_err(|_| {
        format!(
            "Ensure this value is less than or equal to {}.",
            i16::MAX
        )
    })
}

/// First value that appears more than once, if any.
pub fn first_duplicate<T: PartialEq + Copy>(values: &[T]) -> Option<T> {
    values
        .iter()
        .enumerate()
        .find(|&(i, v)| values[..i].contains(v))
        .map(|(_, v)| *v)
}

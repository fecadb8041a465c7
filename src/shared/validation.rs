use lazy_static::lazy_static;
use regex::Regex;

use crate::core::error::{AppError, Result};

lazy_static! {
    /// Regex for validating slugs
    /// Must be lowercase alphanumeric with hyphens
    /// - Valid: "phones", "smart-phones", "tv4k"
    /// - Invalid: "-phones", "phones-", "smart--phones", "Phones", "smart_phones"
    pub static ref SLUG_REGEX: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();

    /// Runs of anything that cannot appear inside a slug segment
    static ref NON_SLUG_CHARS: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
}

/// Derive a URL-safe slug from a display name.
///
/// Lowercases, replaces every run of non-alphanumeric ASCII with a single
/// hyphen and trims hyphens from both ends.
pub fn slugify(name: &str) -> Result<String> {
    let lowered = name.to_lowercase();
    let slug = NON_SLUG_CHARS
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string();

    if slug.is_empty() {
        return Err(AppError::Validation(format!(
            "Cannot derive a slug from name '{}'",
            name
        )));
    }

    Ok(slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_regex_valid() {
        assert!(SLUG_REGEX.is_match("phones"));
        assert!(SLUG_REGEX.is_match("smart-phones"));
        assert!(SLUG_REGEX.is_match("tv4k"));
        assert!(SLUG_REGEX.is_match("a-b-c"));
    }

    #[test]
    fn test_slug_regex_invalid() {
        assert!(!SLUG_REGEX.is_match("-phones")); // starts with hyphen
        assert!(!SLUG_REGEX.is_match("phones-")); // ends with hyphen
        assert!(!SLUG_REGEX.is_match("smart--phones")); // double hyphen
        assert!(!SLUG_REGEX.is_match("Phones")); // uppercase
        assert!(!SLUG_REGEX.is_match("smart_phones")); // underscore
        assert!(!SLUG_REGEX.is_match("")); // empty
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Smart Phones").unwrap(), "smart-phones");
        assert_eq!(slugify("  TV & Audio!! ").unwrap(), "tv-audio");
        assert_eq!(slugify("Laptops_2024").unwrap(), "laptops-2024");
        assert_eq!(slugify("already-a-slug").unwrap(), "already-a-slug");
    }

    #[test]
    fn test_slugify_is_deterministic_and_valid() {
        for name in ["Home / Garden", "Kids' Toys", "4K Monitors", "Über Deals"] {
            let first = slugify(name).unwrap();
            assert_eq!(first, slugify(name).unwrap());
            assert!(SLUG_REGEX.is_match(&first), "bad slug {first:?} for {name:?}");
        }
    }

    #[test]
    fn test_slugify_rejects_symbol_only_names() {
        assert!(matches!(slugify("!!!"), Err(AppError::Validation(_))));
        assert!(matches!(slugify(""), Err(AppError::Validation(_))));
    }
}

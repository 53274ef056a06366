//! File names derived from titles

use crate::error::BookError;

/// Lowercase slug of a title: whitespace runs become `-`, only
/// alphanumerics, `-` and `_` are kept, leading and trailing `-` removed.
/// May be empty.
pub fn slug(title: &str) -> String {
    let words: Vec<String> = title
        .split_whitespace()
        .map(|word| {
            word.chars()
                .flat_map(char::to_lowercase)
                .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect();
    words.join("-").trim_matches('-').to_string()
}

/// Item or book name for a title; an empty result is an error.
pub fn nameify(title: &str) -> Result<String, BookError> {
    let name = slug(title);
    if name.is_empty() {
        return Err(BookError::InvalidName(format!(
            "'{}' does not yield a usable name",
            title
        )));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_nameify_basic() {
        assert_eq!(nameify("Chapter One").unwrap(), "chapter-one");
        assert_eq!(nameify("  The  Origin: of Species! ").unwrap(), "the-origin-of-species");
        assert_eq!(nameify("Åsa & Örjan").unwrap(), "åsa-örjan");
        assert_eq!(nameify("snake_case-name").unwrap(), "snake_case-name");
    }

    #[test]
    fn test_nameify_empty() {
        assert!(matches!(nameify("?!"), Err(BookError::InvalidName(_))));
        assert!(nameify("   ").is_err());
    }

    proptest! {
        #[test]
        fn slug_has_only_allowed_characters(title in "\\PC*") {
            let name = slug(&title);
            prop_assert!(name.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_'));
            prop_assert!(!name.starts_with('-'));
            prop_assert!(!name.ends_with('-'));
        }

        #[test]
        fn slug_is_idempotent(title in "[a-zA-Z0-9 _.-]{0,40}") {
            let once = slug(&title);
            prop_assert_eq!(slug(&once), once.clone());
        }
    }
}

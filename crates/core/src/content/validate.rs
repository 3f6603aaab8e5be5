//! Field validation shared by creation payloads and change sets.

use thiserror::Error;

use crate::mutation::patch::Patch;

const MAX_SLUG_LEN: usize = 128;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("{0} cannot be empty")]
    Empty(&'static str),
    #[error("slug '{0}' must be lowercase letters, digits and single hyphens")]
    MalformedSlug(String),
    #[error("slug cannot exceed 128 characters")]
    SlugTooLong,
    #[error("{0} must be a finite, non-negative number")]
    InvalidAmount(&'static str),
    #[error("limit must be positive")]
    InvalidLimit,
}

/// Validate a URL slug such as `summer-collection`.
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if slug.is_empty() {
        return Err(ValidationError::Empty("slug"));
    }
    if slug.len() > MAX_SLUG_LEN {
        return Err(ValidationError::SlugTooLong);
    }
    let well_formed = slug.split('-').all(|part| {
        !part.is_empty() && part.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
    });
    if !well_formed {
        return Err(ValidationError::MalformedSlug(slug.to_string()));
    }
    Ok(())
}

/// Reject blank values for required text fields.
pub fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty(field));
    }
    Ok(())
}

pub fn require_amount(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::InvalidAmount(field));
    }
    Ok(())
}

/// Apply `check` to the new value if the patch sets one.
pub fn check_patch<T, F>(patch: &Patch<T>, check: F) -> Result<(), ValidationError>
where
    F: FnOnce(&T) -> Result<(), ValidationError>,
{
    match patch {
        Patch::Set(value) => check(value),
        Patch::Unchanged => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_slugs() {
        for slug in ["home", "about-us", "eau-de-parfum-50ml", "2024"] {
            assert_eq!(validate_slug(slug), Ok(()), "{slug}");
        }
    }

    #[test]
    fn rejects_malformed_slugs() {
        assert_eq!(validate_slug(""), Err(ValidationError::Empty("slug")));
        for slug in ["About", "a--b", "-lead", "trail-", "with space", "ünï"] {
            assert!(
                matches!(validate_slug(slug), Err(ValidationError::MalformedSlug(_))),
                "{slug}"
            );
        }
        assert_eq!(
            validate_slug(&"a".repeat(MAX_SLUG_LEN + 1)),
            Err(ValidationError::SlugTooLong)
        );
    }

    #[test]
    fn blank_text_is_rejected() {
        assert_eq!(require_text("title", "  "), Err(ValidationError::Empty("title")));
        assert_eq!(require_text("title", "Home"), Ok(()));
    }

    #[test]
    fn amounts_must_be_finite_and_non_negative() {
        assert_eq!(require_amount("price", 180.0), Ok(()));
        assert_eq!(require_amount("price", 0.0), Ok(()));
        assert!(require_amount("price", -1.0).is_err());
        assert!(require_amount("price", f64::NAN).is_err());
        assert!(require_amount("price", f64::INFINITY).is_err());
    }

    #[test]
    fn unchanged_patch_skips_check() {
        let patch: Patch<String> = Patch::Unchanged;
        assert_eq!(check_patch(&patch, |v| require_text("title", v)), Ok(()));

        let patch = Patch::Set(String::new());
        assert_eq!(
            check_patch(&patch, |v| require_text("title", v)),
            Err(ValidationError::Empty("title"))
        );
    }
}

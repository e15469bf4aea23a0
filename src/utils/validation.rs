//! Argument validation helpers.

use crate::error::{Error, Result};

/// Validate a release token of the form `major.minor` (e.g. 2025.8).
pub fn require_release_token(value: &str) -> Result<()> {
    let mut parts = value.split('.');
    let valid = matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some(major), Some(minor), None)
            if !major.is_empty()
                && !minor.is_empty()
                && major.chars().all(|c| c.is_ascii_digit())
                && minor.chars().all(|c| c.is_ascii_digit())
    );

    if valid {
        Ok(())
    } else {
        Err(Error::validation_invalid_argument(
            "newRelease",
            format!("'{}' must look like 'YYYY.M' (e.g. 2025.8)", value),
            Some(vec![value.to_string()]),
        ))
    }
}

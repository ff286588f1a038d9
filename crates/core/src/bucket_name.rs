//! Bucket naming rules

use crate::error::{Error, Result};

const MAX_NAME_LEN: usize = 63;
const MAX_DOTTED_NAME_LEN: usize = 222;

/// Validate a bucket name, returning the first rule it breaks
pub fn validate_bucket_name(name: &str) -> Result<()> {
    let fail = |reason: &str| {
        Err(Error::InvalidBucketName {
            name: name.to_string(),
            reason: reason.to_string(),
        })
    };

    if name.is_empty() {
        return fail("The bucket name is required.");
    }
    if name.len() < 3 {
        return fail("The bucket name must contain at least 3 characters.");
    }

    let is_alnum = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
    let starts_ok = name.chars().next().is_some_and(is_alnum);
    let ends_ok = name.chars().last().is_some_and(is_alnum);
    if !starts_ok || !ends_ok {
        return fail("The bucket name must start and end with a number or letter.");
    }

    if !name
        .chars()
        .all(|c| is_alnum(c) || c == '-' || c == '_' || c == '.')
    {
        return fail(
            "The bucket name must contain only lowercase letters, numbers, dashes (-), underscores (_), and dots (.).",
        );
    }

    if is_dotted_quad(name) {
        return fail(
            "The bucket name cannot be represented as an IP address in dotted-decimal notation (for example, 192.168.5.4).",
        );
    }

    if name.starts_with("goog") || name.starts_with("g00g") {
        return fail(
            "The bucket name cannot begin with the \"goog\" prefix or contain close misspellings, such as \"g00gle\".",
        );
    }

    if name.contains('.') {
        if name.len() > MAX_DOTTED_NAME_LEN {
            return fail("Bucket names containing dots cannot exceed 222 characters.");
        }
        if name.split('.').any(|part| part.len() > MAX_NAME_LEN) {
            return fail(
                "Bucket names containing dots cannot have dot-separated components longer than 63 characters.",
            );
        }
    } else if name.len() > MAX_NAME_LEN {
        return fail("Bucket names cannot be longer than 63 characters.");
    }

    Ok(())
}

fn is_dotted_quad(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    parts.len() == 4
        && parts
            .iter()
            .all(|p| (1..=3).contains(&p.len()) && p.chars().all(|c| c.is_ascii_digit()))
}

//! Domain types shared across GeoStacks crates.

use serde::{Deserialize, Serialize};

/// A provisioned site. The automation engine's stack state is the source
/// of truth; this is the shape handed back to API callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    /// Username, used verbatim as the stack name.
    pub id: String,
    /// Public website endpoint recorded as a stack output.
    pub url: String,
}

/// A site listing entry. The url is absent when the stack exists but has
/// no recorded output yet (failed or in-progress provision).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteSummary {
    pub id: String,
    pub url: Option<String>,
}

/// Maximum username length. The name is embedded in the bucket name, which
/// the storage provider caps at 63 characters.
const MAX_USERNAME_LEN: usize = 40;

/// Validate a username for use as a stack name and bucket-name fragment.
///
/// Lowercase ASCII alphanumerics and hyphens only, must start and end with
/// an alphanumeric, at most 40 characters.
pub fn validate_username(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("username must not be empty".to_string());
    }
    if name.len() > MAX_USERNAME_LEN {
        return Err(format!(
            "username must be at most {MAX_USERNAME_LEN} characters"
        ));
    }
    let valid_chars = name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-');
    if !valid_chars {
        return Err(
            "username may only contain lowercase letters, digits, and hyphens".to_string(),
        );
    }
    // Bucket names must not start or end with a hyphen.
    if name.starts_with('-') || name.ends_with('-') {
        return Err("username must start and end with a letter or digit".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_simple_names() {
        assert!(validate_username("chris").is_ok());
        assert!(validate_username("user-42").is_ok());
        assert!(validate_username("a").is_ok());
    }

    #[test]
    fn rejects_empty() {
        assert!(validate_username("").is_err());
    }

    #[test]
    fn rejects_bad_characters() {
        assert!(validate_username("Chris").is_err());
        assert!(validate_username("chris smith").is_err());
        assert!(validate_username("chris_smith").is_err());
        assert!(validate_username("chris/../etc").is_err());
    }

    #[test]
    fn rejects_hyphen_at_edges() {
        assert!(validate_username("-chris").is_err());
        assert!(validate_username("chris-").is_err());
    }

    #[test]
    fn rejects_overlong() {
        let name = "a".repeat(41);
        assert!(validate_username(&name).is_err());
        let name = "a".repeat(40);
        assert!(validate_username(&name).is_ok());
    }
}

use crate::error::{AppError, Result};

/// Stored representations a login attempt can be checked against.
///
/// Rows written before hashing was introduced hold the raw password, so the
/// legacy branch stays until those rows are migrated. It is compared by
/// byte equality, which makes the stored value password-equivalent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredPassword<'a> {
    Bcrypt(&'a str),
    Legacy(&'a str),
}

const BCRYPT_PREFIXES: [&str; 3] = ["$2a$", "$2b$", "$2y$"];

impl<'a> StoredPassword<'a> {
    /// Picks the comparison strategy by inspecting the stored value's prefix.
    #[must_use]
    pub fn classify(stored: &'a str) -> Self {
        if BCRYPT_PREFIXES.iter().any(|prefix| stored.starts_with(prefix)) {
            Self::Bcrypt(stored)
        } else {
            Self::Legacy(stored)
        }
    }

    /// # Errors
    /// Returns `AppError::Internal` if the stored bcrypt value cannot be
    /// parsed by the verifier.
    pub fn matches(self, presented: &str) -> Result<bool> {
        match self {
            Self::Bcrypt(hash) => bcrypt::verify(presented, hash).map_err(|_| AppError::Internal),
            Self::Legacy(stored) => Ok(stored.as_bytes() == presented.as_bytes()),
        }
    }
}

/// Checks a presented password against an optional stored value. Missing or
/// blank stored values never match.
///
/// # Errors
/// Propagates verifier failures from [`StoredPassword::matches`].
pub fn matches_stored(stored: Option<&str>, presented: &str) -> Result<bool> {
    match stored {
        Some(value) if !value.trim().is_empty() => StoredPassword::classify(value).matches(presented),
        _ => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bcrypt_prefixes_classify_as_hashed() {
        for prefix in ["$2a$", "$2b$", "$2y$"] {
            let stored = format!("{prefix}10$abcdefghijklmnopqrstuv");
            assert!(matches!(StoredPassword::classify(&stored), StoredPassword::Bcrypt(_)));
        }
        assert!(matches!(StoredPassword::classify("secret"), StoredPassword::Legacy(_)));
        assert!(matches!(StoredPassword::classify("$argon2id$v=19$"), StoredPassword::Legacy(_)));
    }

    #[test]
    fn legacy_value_matches_by_equality_only() {
        assert!(matches_stored(Some("secret"), "secret").unwrap());
        assert!(!matches_stored(Some("secret"), "Secret").unwrap());
        assert!(!matches_stored(Some("secret"), "secret ").unwrap());
    }

    #[test]
    fn hashed_value_matches_the_plaintext_not_the_hash() {
        let hash = bcrypt::hash("secret", 4).unwrap();
        assert!(matches_stored(Some(&hash), "secret").unwrap());
        assert!(!matches_stored(Some(&hash), "wrong").unwrap());
        // Presenting the stored hash itself must not authenticate.
        assert!(!matches_stored(Some(&hash), &hash).unwrap());
    }

    #[test]
    fn blank_stored_value_never_matches() {
        assert!(!matches_stored(None, "anything").unwrap());
        assert!(!matches_stored(Some(""), "").unwrap());
        assert!(!matches_stored(Some("   "), "   ").unwrap());
    }
}

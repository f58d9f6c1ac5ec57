// @zen-component: AUTH-CredentialEngine
//
//! Password strength validation and hashing via bcrypt.

use tracing::debug;

use super::AuthError;

/// bcrypt cost factor used when none is configured.
pub const DEFAULT_HASH_COST: u32 = 12;

/// Minimum password length in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Symbols accepted by the special-character rule.
pub const SPECIAL_CHARACTERS: &str = "!@#$%^&*(),.?\":{}|<>";

/// Outcome of a password strength check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordStrength {
    pub is_valid: bool,
    /// Message for the first violated rule.
    pub message: Option<String>,
}

impl PasswordStrength {
    fn ok() -> Self {
        Self {
            is_valid: true,
            message: None,
        }
    }

    fn fail(message: &str) -> Self {
        Self {
            is_valid: false,
            message: Some(message.to_string()),
        }
    }
}

/// Check a password against the strength rules.
///
/// Rules run in a fixed order (length, uppercase, lowercase, digit, symbol)
/// and the first failure is reported.
pub fn validate_password_strength(password: &str) -> PasswordStrength {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return PasswordStrength::fail("Password must be at least 8 characters long");
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        return PasswordStrength::fail("Password must contain at least one uppercase letter");
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        return PasswordStrength::fail("Password must contain at least one lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return PasswordStrength::fail("Password must contain at least one number");
    }
    if !password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)) {
        return PasswordStrength::fail(
            "Password must contain at least one special character (!@#$%^&*(),.?\":{}|<>)",
        );
    }
    PasswordStrength::ok()
}

/// Hash a password with bcrypt at [`DEFAULT_HASH_COST`].
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    hash_password_with_cost(password, DEFAULT_HASH_COST)
}

/// Hash a password with bcrypt at the given cost.
pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, AuthError> {
    if password.is_empty() {
        return Err(AuthError::ValidationError("Password must not be empty".into()));
    }
    bcrypt::hash(password, cost).map_err(|e| AuthError::Internal(format!("bcrypt hash: {e}")))
}

/// Verify a password against a bcrypt hash.
///
/// A malformed hash counts as a mismatch.
pub fn compare_passwords(password: &str, hash: &str) -> bool {
    match bcrypt::verify(password, hash) {
        Ok(matches) => matches,
        Err(e) => {
            debug!(error = %e, "bcrypt verify failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4;

    #[test]
    fn short_password_reports_length() {
        for pw in ["", "A1!a", "Abc12!x"] {
            let result = validate_password_strength(pw);
            assert!(!result.is_valid);
            assert_eq!(
                result.message.as_deref(),
                Some("Password must be at least 8 characters long")
            );
        }
    }

    #[test]
    fn first_missing_class_wins() {
        // No uppercase and no symbol: uppercase is checked first.
        let result = validate_password_strength("abcdefg1");
        assert!(!result.is_valid);
        assert!(result.message.unwrap().contains("uppercase"));

        let result = validate_password_strength("ABCDEFG1!");
        assert!(result.message.unwrap().contains("lowercase"));

        let result = validate_password_strength("Abcdefgh!");
        assert!(result.message.unwrap().contains("number"));

        let result = validate_password_strength("Abcdefg1");
        assert!(result.message.unwrap().contains("special character"));
    }

    #[test]
    fn strong_password_passes() {
        let result = validate_password_strength("Sup3r$ecret");
        assert!(result.is_valid);
        assert!(result.message.is_none());
    }

    #[test]
    fn symbol_outside_set_is_not_enough() {
        let result = validate_password_strength("Abcdefg1_");
        assert!(!result.is_valid);
    }

    #[test]
    fn hash_round_trip() {
        let hash = hash_password_with_cost("Sup3r$ecret", TEST_COST).unwrap();
        assert_ne!(hash, "Sup3r$ecret");
        assert!(compare_passwords("Sup3r$ecret", &hash));

        let other = hash_password_with_cost("Sup3r$ecretx", TEST_COST).unwrap();
        assert!(!compare_passwords("Sup3r$ecret", &other));
    }

    #[test]
    fn default_cost_round_trip() {
        let hash = hash_password("Sup3r$ecret").unwrap();
        assert!(hash.starts_with("$2b$12$"));
        assert!(compare_passwords("Sup3r$ecret", &hash));
    }

    #[test]
    fn malformed_hash_is_false() {
        assert!(!compare_passwords("anything", "not-a-bcrypt-hash"));
        assert!(!compare_passwords("anything", ""));
    }

    #[test]
    fn empty_password_rejected() {
        assert!(matches!(
            hash_password_with_cost("", TEST_COST),
            Err(AuthError::ValidationError(_))
        ));
    }
}

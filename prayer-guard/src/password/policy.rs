//! Password validation for account creation
//!
//! Rules are checked in order and evaluation stops at the first failure:
//!
//! 1. No leading or trailing whitespace
//! 2. 8 to 64 characters
//! 3. At least one uppercase letter (A-Z)
//! 4. At least one lowercase letter (a-z)
//! 5. At least one digit (0-9)
//! 6. At least one special character from [`SPECIAL_CHARS`]
//! 7. No character repeated 4 or more times in a row
//! 8. None of the [`BANNED_PATTERNS`], case-insensitive
//!
//! Every failure produces the same [`PASSWORD_POLICY_MESSAGE`], so a caller
//! cannot learn which rule rejected the password. Long passphrases such as
//! `BlueSky!Prayer2026` are fine.

use serde::{Deserialize, Serialize};
use tracing::debug;

pub const MIN_LENGTH: usize = 8;
pub const MAX_LENGTH: usize = 64;

/// Longest allowed run of one repeated character
const MAX_REPEAT: usize = 3;

/// Characters that satisfy the special-character rule
pub const SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{};':\"\\|,.<>/?`~";

/// Substrings rejected regardless of case
pub const BANNED_PATTERNS: [&str; 5] = ["password", "123456", "qwerty", "admin", "gospelera"];

/// The only error text ever returned for a rejected password
pub const PASSWORD_POLICY_MESSAGE: &str = "Password must be 8–64 characters and include uppercase, lowercase, a number, and a special character. Avoid common words and repeated characters.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordValidationResult {
    pub valid: bool,
    pub error: Option<String>,
}

impl PasswordValidationResult {
    fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    fn rejected() -> Self {
        Self {
            valid: false,
            error: Some(PASSWORD_POLICY_MESSAGE.to_string()),
        }
    }
}

/// Individual policy rules, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PasswordRule {
    SurroundingWhitespace,
    Length,
    Uppercase,
    Lowercase,
    Digit,
    SpecialChar,
    Repetition,
    BannedPattern,
}

/// Fixed password policy
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordPolicy;

impl PasswordPolicy {
    pub fn new() -> Self {
        Self
    }

    /// Validate a candidate password
    pub fn validate(&self, password: &str) -> PasswordValidationResult {
        match first_violation(password) {
            None => PasswordValidationResult::ok(),
            Some(rule) => {
                // Never surfaced to the caller
                debug!("Password rejected by rule {:?}", rule);
                PasswordValidationResult::rejected()
            }
        }
    }

    pub fn is_valid(&self, password: &str) -> bool {
        first_violation(password).is_none()
    }
}

/// Validate a password against the fixed policy
pub fn validate_password(password: &str) -> PasswordValidationResult {
    PasswordPolicy::new().validate(password)
}

fn first_violation(password: &str) -> Option<PasswordRule> {
    if password != password.trim() {
        return Some(PasswordRule::SurroundingWhitespace);
    }

    let length = password.chars().count();
    if !(MIN_LENGTH..=MAX_LENGTH).contains(&length) {
        return Some(PasswordRule::Length);
    }

    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Some(PasswordRule::Uppercase);
    }

    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Some(PasswordRule::Lowercase);
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Some(PasswordRule::Digit);
    }

    if !password.chars().any(|c| SPECIAL_CHARS.contains(c)) {
        return Some(PasswordRule::SpecialChar);
    }

    if has_excessive_repetition(password) {
        return Some(PasswordRule::Repetition);
    }

    if contains_banned_pattern(password) {
        return Some(PasswordRule::BannedPattern);
    }

    None
}

/// True when any window of MAX_REPEAT + 1 characters is a single character
fn has_excessive_repetition(password: &str) -> bool {
    let chars: Vec<char> = password.chars().collect();
    chars
        .windows(MAX_REPEAT + 1)
        .any(|w| w.iter().all(|c| *c == w[0]))
}

fn contains_banned_pattern(password: &str) -> bool {
    let lower = password.to_lowercase();
    BANNED_PATTERNS.iter().any(|pattern| lower.contains(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passphrase_is_valid() {
        let result = validate_password("BlueSky!Prayer2026");
        assert!(result.valid);
        assert!(result.error.is_none());
    }

    #[test]
    fn test_length_bounds() {
        assert_eq!(first_violation("Ab1!xyz"), Some(PasswordRule::Length));
        assert!(validate_password("Ab1!xyzw").valid);

        let max = format!("Ab1!{}", "xyz".repeat(20));
        assert_eq!(max.chars().count(), 64);
        assert!(validate_password(&max).valid);

        let too_long = format!("{}w", max);
        assert!(!validate_password(&too_long).valid);
        assert!(!validate_password("").valid);
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // 8 characters, more than 8 bytes
        assert!(validate_password("Ab1!éèüö").valid);
    }

    #[test]
    fn test_requires_uppercase() {
        assert_eq!(
            first_violation("bluesky!prayer2026"),
            Some(PasswordRule::Uppercase)
        );
        assert!(!validate_password("bluesky!prayer2026").valid);
    }

    #[test]
    fn test_requires_lowercase_digit_special() {
        assert_eq!(
            first_violation("BLUESKY!PRAYER2026"),
            Some(PasswordRule::Lowercase)
        );
        assert_eq!(
            first_violation("BlueSky!Prayer"),
            Some(PasswordRule::Digit)
        );
        assert_eq!(
            first_violation("BlueSkyPrayer2026"),
            Some(PasswordRule::SpecialChar)
        );
    }

    #[test]
    fn test_every_special_char_counts() {
        for c in SPECIAL_CHARS.chars() {
            let password = format!("BlueSky{}Prayer26", c);
            assert!(validate_password(&password).valid, "{} should count", c);
        }
    }

    #[test]
    fn test_whitespace_is_not_special() {
        assert_eq!(
            first_violation("Blue Sky Prayer26"),
            Some(PasswordRule::SpecialChar)
        );
    }

    #[test]
    fn test_surrounding_whitespace() {
        assert_eq!(
            first_violation(" Abcdef1!"),
            Some(PasswordRule::SurroundingWhitespace)
        );
        assert!(!validate_password("Abcdef1! ").valid);
        assert!(!validate_password("\tAbcdef1!").valid);
    }

    #[test]
    fn test_repetition() {
        assert_eq!(first_violation("aaaa1A!aaaa"), Some(PasswordRule::Repetition));
        assert!(!validate_password("Prayer!!!!26").valid);
        assert!(validate_password("Prayer!!!26").valid);
        assert!(validate_password("aaa1A!bbb").valid);
    }

    #[test]
    fn test_banned_patterns() {
        assert_eq!(
            first_violation("Password1!"),
            Some(PasswordRule::BannedPattern)
        );
        assert!(!validate_password("MyQWERTY!9x").valid);
        assert!(!validate_password("Admin#2026x").valid);
        assert!(!validate_password("GospelEra!2026").valid);
        assert!(!validate_password("Xy!1234567").valid);
    }

    #[test]
    fn test_same_message_for_every_rule() {
        let failures = [
            " Abcdef1!",
            "Ab1!",
            "abcdefg1!",
            "ABCDEFG1!",
            "Abcdefgh!",
            "Abcdefgh1",
            "Abbbbcd1!",
            "Password1!",
        ];

        for password in failures {
            let result = validate_password(password);
            assert!(!result.valid, "{} should be rejected", password);
            assert_eq!(result.error.as_deref(), Some(PASSWORD_POLICY_MESSAGE));
        }
    }

    #[test]
    fn test_is_valid() {
        let policy = PasswordPolicy::new();
        assert!(policy.is_valid("Grace&Peace77"));
        assert!(!policy.is_valid("grace&peace77"));
    }
}

//! Integration tests for the account password policy

use prayer_guard::password::{validate_password, PasswordPolicy, PASSWORD_POLICY_MESSAGE};

fn assert_rejected(password: &str) {
    let result = validate_password(password);
    assert!(!result.valid, "{:?} should be rejected", password);
    assert_eq!(result.error.as_deref(), Some(PASSWORD_POLICY_MESSAGE));
}

#[test]
fn test_valid_passphrase() {
    let result = validate_password("BlueSky!Prayer2026");
    assert!(result.valid);
    assert_eq!(result.error, None);
}

#[test]
fn test_length_limits() {
    for len in 0..8 {
        let password: String = "Ab1!cdefgh".chars().take(len).collect();
        assert_rejected(&password);
    }

    let long = format!("Ab1!{}", "xy".repeat(31));
    assert_eq!(long.len(), 66);
    assert_rejected(&long);
}

#[test]
fn test_missing_uppercase_always_rejected() {
    for password in ["bluesky!prayer2026", "grace&peace77", "x9#mercy-new"] {
        assert_rejected(password);
    }
}

#[test]
fn test_four_repeated_characters() {
    assert_rejected("aaaa1A!aaaa");
    assert_rejected("Faith1111!x");
}

#[test]
fn test_banned_words_any_case() {
    assert_rejected("Password1!");
    assert_rejected("pASSWORD1!x");
    assert_rejected("Hi!GOSPELERA9");
}

#[test]
fn test_leading_space() {
    assert_rejected(" Abcdef1!");
}

#[test]
fn test_policy_struct_matches_function() {
    let policy = PasswordPolicy::new();
    for password in ["BlueSky!Prayer2026", "Password1!", " Abcdef1!"] {
        assert_eq!(policy.validate(password), validate_password(password));
    }
}

#[test]
fn test_result_json_shape() {
    let json = serde_json::to_value(validate_password("nope")).unwrap();
    assert_eq!(json["valid"], false);
    assert_eq!(json["error"], PASSWORD_POLICY_MESSAGE);
}

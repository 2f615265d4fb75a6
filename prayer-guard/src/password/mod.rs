//! Password policy for account creation

pub mod policy;

pub use policy::{validate_password, PasswordPolicy, PasswordValidationResult, PASSWORD_POLICY_MESSAGE};

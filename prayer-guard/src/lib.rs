//! prayer-guard: anti-abuse checks for Gospel Era
//!
//! Two independent decision components used by the app before it lets a
//! user act:
//!
//! - **Spam scoring**: behavioral scoring of "commit to pray" actions that
//!   deters bots from mass-committing to prayer requests
//! - **Password policy**: validation of new account passwords with a single
//!   generic error message
//!
//! # Example
//!
//! ```no_run
//! use prayer_guard::config::Config;
//! use prayer_guard::password::validate_password;
//! use prayer_guard::spam::SpamManager;
//! use prayer_guard::store::SqliteCommitmentStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let store = Arc::new(SqliteCommitmentStore::connect(&config.storage.database_url).await?);
//!     let spam = SpamManager::new(store, config.spam.clone());
//!
//!     let check = spam.check_prayer_commitment_spam("user-id").await;
//!     if !check.allowed {
//!         println!("{}", check.reason.unwrap_or_default());
//!     }
//!
//!     assert!(validate_password("BlueSky!Prayer2026").valid);
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration management
//! - [`error`]: Error types and handling
//! - [`password`]: Password policy
//! - [`spam`]: Prayer commitment spam scoring
//! - [`store`]: Commitment persistence
//! - [`prayer`]: Commit / confirm / uncommit flow

pub mod config;
pub mod error;
pub mod password;
pub mod prayer;
pub mod spam;
pub mod store;

// Re-export commonly used types
pub use config::Config;
pub use error::{GuardError, Result};
pub use password::{validate_password, PasswordValidationResult};
pub use spam::{SpamCheckResult, SpamManager, WarningLevel};

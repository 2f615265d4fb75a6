//! Prayer commitment spam scoring module
//!
//! Rule-based behavioral scoring that deters bots from mass-committing to
//! prayer requests.

pub mod manager;
pub mod scorer;
pub mod types;

pub use crate::config::SpamConfig;
pub use manager::SpamManager;
pub use scorer::SpamScorer;
pub use types::*;

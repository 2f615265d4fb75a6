//! Prayer commitment actions gated by the spam check

pub mod service;

pub use service::{CommitOutcome, PrayerService, BLOCKED_FALLBACK_REASON};

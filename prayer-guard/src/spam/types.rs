//! Spam types and data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GuardError;

/// Lifecycle state of a prayer commitment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitmentStatus {
    /// Pledged but not yet confirmed
    Committed,
    /// The warrior clicked "I Prayed"
    Prayed,
}

impl CommitmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Committed => "committed",
            Self::Prayed => "prayed",
        }
    }
}

impl FromStr for CommitmentStatus {
    type Err = GuardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "committed" => Ok(Self::Committed),
            "prayed" => Ok(Self::Prayed),
            other => Err(GuardError::Parse(format!(
                "Unknown commitment status: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for CommitmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The slice of a commitment the scorer looks at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitmentRecord {
    pub committed_at: DateTime<Utc>,
    pub status: CommitmentStatus,
}

impl CommitmentRecord {
    pub fn new(committed_at: DateTime<Utc>, status: CommitmentStatus) -> Self {
        Self {
            committed_at,
            status,
        }
    }
}

/// Everything the scorer needs to know about one user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrayerHistory {
    /// None when the profile could not be read
    pub account_created_at: Option<DateTime<Utc>>,
    /// Newest first
    pub commitments: Vec<CommitmentRecord>,
}

/// Behavioral aggregates computed fresh for every check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPrayerStats {
    pub account_age_days: f64,
    pub recent_commitments_5min: u32,
    pub rapid_fire_commitments_10s: u32,
    pub total_commitments: u32,
    pub prayed_confirmations: u32,
    pub confirmation_ratio_pct: f64,
}

impl Default for UserPrayerStats {
    /// An established account with no history
    fn default() -> Self {
        Self {
            account_age_days: 999.0,
            recent_commitments_5min: 0,
            rapid_fire_commitments_10s: 0,
            total_commitments: 0,
            prayed_confirmations: 0,
            confirmation_ratio_pct: 100.0,
        }
    }
}

/// A behavioral signal that adds to the spam score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactor {
    NewAccount,
    TooManyRecent,
    RapidFire,
    LowConfirmation,
}

impl RiskFactor {
    /// Order in which factors pick the user-facing message, most severe first
    pub const PRIORITY: [RiskFactor; 4] = [
        RiskFactor::RapidFire,
        RiskFactor::TooManyRecent,
        RiskFactor::LowConfirmation,
        RiskFactor::NewAccount,
    ];

    /// Short tag used in logs
    pub fn tag(&self) -> &'static str {
        match self {
            RiskFactor::NewAccount => "new account",
            RiskFactor::TooManyRecent => "too many recent commitments",
            RiskFactor::RapidFire => "rapid-fire commitments",
            RiskFactor::LowConfirmation => "low prayer confirmation rate",
        }
    }
}

impl fmt::Display for RiskFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// How loudly the UI should surface the result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningLevel {
    None,
    Low,
    High,
}

/// Verdict returned to the caller before a "commit to pray" action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpamCheckResult {
    pub allowed: bool,
    pub score: u32,
    pub reason: Option<String>,
    pub warning_level: WarningLevel,
}

impl SpamCheckResult {
    /// Permissive result used when scoring could not run
    pub fn fail_open() -> Self {
        Self {
            allowed: true,
            score: 0,
            reason: None,
            warning_level: WarningLevel::None,
        }
    }
}

/// A user whose confirmation ratio looks suspicious
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuspiciousUser {
    pub user_id: String,
    pub total: u32,
    pub prayed: u32,
    pub ratio: f64,
}

/// Admin dashboard summary across all warriors
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpamStatistics {
    pub total_users: usize,
    pub suspicious_users: usize,
    pub details: Vec<SuspiciousUser>,
}

//! Commitment persistence
//!
//! The spam manager only needs three reads, expressed by [`CommitmentStore`].
//! [`SqliteCommitmentStore`] backs them with SQLite and adds the writes used
//! by the prayer service.

pub mod sqlite;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::spam::{CommitmentRecord, CommitmentStatus};

pub use sqlite::SqliteCommitmentStore;

/// A warrior's pledge to pray for one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrayerCommitment {
    pub id: String,
    pub request_id: i64,
    pub warrior_id: String,
    pub committed_at: DateTime<Utc>,
    pub status: CommitmentStatus,
    pub prayed_at: Option<DateTime<Utc>>,
    pub note: Option<String>,
}

impl PrayerCommitment {
    pub fn record(&self) -> CommitmentRecord {
        CommitmentRecord::new(self.committed_at, self.status)
    }
}

/// Kind of entry in the prayer activity log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Commitment,
    Uncommitment,
    PrayerCompleted,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Commitment => "commitment",
            Self::Uncommitment => "uncommitment",
            Self::PrayerCompleted => "prayer_completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "commitment" => Some(Self::Commitment),
            "uncommitment" => Some(Self::Uncommitment),
            "prayer_completed" => Some(Self::PrayerCompleted),
            _ => None,
        }
    }
}

/// Activity feed entry for a prayer request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrayerActivity {
    pub request_id: i64,
    pub actor: String,
    pub kind: ActivityKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Reads the spam manager performs against the persistence layer
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CommitmentStore: Send + Sync {
    /// Account creation time, or None when the profile does not exist
    async fn account_created_at(&self, user_id: &str) -> Result<Option<DateTime<Utc>>>;

    /// The user's commitments, newest first, optionally capped at `limit`
    async fn list_commitments(
        &self,
        user_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<CommitmentRecord>>;

    /// Every commitment as (warrior, status), for the admin report
    async fn list_all_commitments(&self) -> Result<Vec<(String, CommitmentStatus)>>;
}

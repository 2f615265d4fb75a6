//! Commit / confirm / uncommit flow for prayer requests
//!
//! Every new commitment passes through the spam check first. A blocked check
//! rejects the action; a warning is handed back alongside the commitment so
//! the UI can show it as a toast.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{GuardError, Result};
use crate::spam::{SpamManager, WarningLevel};
use crate::store::{ActivityKind, PrayerActivity, PrayerCommitment, SqliteCommitmentStore};

/// Returned to the caller when a block has no reason attached
pub const BLOCKED_FALLBACK_REASON: &str = "Unable to commit at this time";

/// Result of a successful commitment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitOutcome {
    pub commitment: PrayerCommitment,
    /// Non-blocking warning to surface to the user
    pub spam_warning: Option<String>,
}

/// Prayer commitment service
pub struct PrayerService {
    store: Arc<SqliteCommitmentStore>,
    spam: SpamManager,
}

impl PrayerService {
    pub fn new(store: Arc<SqliteCommitmentStore>, spam: SpamManager) -> Self {
        Self { store, spam }
    }

    /// Commit `user_id` to pray for `request_id`
    pub async fn commit_to_pray(&self, user_id: &str, request_id: i64) -> Result<CommitOutcome> {
        let check = self.spam.check_prayer_commitment_spam(user_id).await;

        if !check.allowed {
            warn!("Commitment by {} to request {} blocked", user_id, request_id);
            return Err(GuardError::CommitmentBlocked(
                check
                    .reason
                    .unwrap_or_else(|| BLOCKED_FALLBACK_REASON.to_string()),
            ));
        }

        let now = Utc::now();
        let commitment = self.store.upsert_commitment(request_id, user_id, now).await?;

        self.store
            .log_activity(&PrayerActivity {
                request_id,
                actor: user_id.to_string(),
                kind: ActivityKind::Commitment,
                message: "committed to pray".to_string(),
                created_at: now,
            })
            .await?;

        info!("{} committed to pray for request {}", user_id, request_id);

        let spam_warning = match check.warning_level {
            WarningLevel::None => None,
            WarningLevel::Low | WarningLevel::High => check.reason,
        };

        Ok(CommitOutcome {
            commitment,
            spam_warning,
        })
    }

    /// Record that `user_id` has prayed for `request_id`
    pub async fn confirm_prayed(
        &self,
        user_id: &str,
        request_id: i64,
        note: Option<&str>,
    ) -> Result<PrayerCommitment> {
        let now = Utc::now();
        let commitment = self
            .store
            .mark_prayed(request_id, user_id, note, now)
            .await?;

        let message = match commitment.note.as_deref() {
            Some(note) => format!("prayed with note: {}", note),
            None => "completed prayer".to_string(),
        };

        self.store
            .log_activity(&PrayerActivity {
                request_id,
                actor: user_id.to_string(),
                kind: ActivityKind::PrayerCompleted,
                message,
                created_at: now,
            })
            .await?;

        info!("{} prayed for request {}", user_id, request_id);
        Ok(commitment)
    }

    /// Withdraw a commitment; returns false when none existed
    pub async fn uncommit(&self, user_id: &str, request_id: i64) -> Result<bool> {
        let removed = self.store.delete_commitment(request_id, user_id).await?;

        self.store
            .log_activity(&PrayerActivity {
                request_id,
                actor: user_id.to_string(),
                kind: ActivityKind::Uncommitment,
                message: "removed prayer commitment".to_string(),
                created_at: Utc::now(),
            })
            .await?;

        Ok(removed)
    }
}

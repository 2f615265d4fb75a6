//! Spam manager
//!
//! Fetches a user's history from the commitment store, runs the scorer and
//! builds the admin statistics report. Store failures never reach the
//! caller: the check fails open and the report comes back empty.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::scorer::SpamScorer;
use super::types::*;
use crate::config::SpamConfig;
use crate::error::Result;
use crate::store::CommitmentStore;

/// Spam manager
#[derive(Clone)]
pub struct SpamManager {
    store: Arc<dyn CommitmentStore>,
    scorer: SpamScorer,
}

impl SpamManager {
    /// Create a new spam manager
    pub fn new(store: Arc<dyn CommitmentStore>, config: SpamConfig) -> Self {
        Self {
            store,
            scorer: SpamScorer::new(config),
        }
    }

    pub fn scorer(&self) -> &SpamScorer {
        &self.scorer
    }

    /// Check whether `user_id` may commit to pray right now
    pub async fn check_prayer_commitment_spam(&self, user_id: &str) -> SpamCheckResult {
        self.check_at(user_id, Utc::now()).await
    }

    /// Check as of `now`
    pub async fn check_at(&self, user_id: &str, now: DateTime<Utc>) -> SpamCheckResult {
        let history = match self.fetch_history(user_id).await {
            Ok(history) => history,
            Err(e) => {
                error!("Spam check error for {}: {}", user_id, e);
                return SpamCheckResult::fail_open();
            }
        };

        let stats = self.scorer.stats(&history, now);
        let result = self.scorer.evaluate(&stats);

        if result.allowed {
            debug!(
                "Spam check for {}: score {} ({:?})",
                user_id, result.score, result.warning_level
            );
        } else {
            let factors: Vec<&str> = self
                .scorer
                .risk_factors(&stats)
                .iter()
                .map(|f| f.tag())
                .collect();
            warn!(
                "Blocking prayer commitment for {}: score {} [{}]",
                user_id,
                result.score,
                factors.join(", ")
            );
        }

        result
    }

    /// Both reads are independent and run concurrently
    async fn fetch_history(&self, user_id: &str) -> Result<PrayerHistory> {
        let limit = self.scorer.config().history_limit;

        let (account_created_at, commitments) = tokio::try_join!(
            self.store.account_created_at(user_id),
            self.store.list_commitments(user_id, limit),
        )?;

        Ok(PrayerHistory {
            account_created_at,
            commitments,
        })
    }

    /// Users whose confirmation ratio looks suspicious, for the admin dashboard
    pub async fn spam_statistics(&self) -> SpamStatistics {
        match self.store.list_all_commitments().await {
            Ok(commitments) => {
                let stats = summarize(&commitments, self.scorer.config());
                info!(
                    "Spam statistics: {} users, {} suspicious",
                    stats.total_users, stats.suspicious_users
                );
                stats
            }
            Err(e) => {
                error!("Failed to get spam statistics: {}", e);
                SpamStatistics::default()
            }
        }
    }
}

fn summarize(commitments: &[(String, CommitmentStatus)], config: &SpamConfig) -> SpamStatistics {
    // (total, prayed) per warrior, sorted by id for stable output
    let mut per_user: BTreeMap<&str, (u32, u32)> = BTreeMap::new();

    for (warrior, status) in commitments {
        let entry = per_user.entry(warrior.as_str()).or_insert((0, 0));
        entry.0 += 1;
        if *status == CommitmentStatus::Prayed {
            entry.1 += 1;
        }
    }

    let details: Vec<SuspiciousUser> = per_user
        .iter()
        .map(|(user_id, (total, prayed))| SuspiciousUser {
            user_id: user_id.to_string(),
            total: *total,
            prayed: *prayed,
            ratio: f64::from(*prayed) / f64::from(*total) * 100.0,
        })
        .filter(|u| {
            u.total >= config.min_commitments_for_ratio && u.ratio < config.min_confirmation_ratio
        })
        .collect();

    SpamStatistics {
        total_users: per_user.len(),
        suspicious_users: details.len(),
        details,
    }
}

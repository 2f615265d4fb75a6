//! Prayer commitment spam scoring engine
//!
//! Turns a user's commitment history into [`UserPrayerStats`] and the stats
//! into an allow/warn/block verdict. Every factor is independent and the
//! points add up.

use chrono::{DateTime, Duration, Utc};

use super::types::*;
use crate::config::SpamConfig;

/// Windows longer than a century are treated as a century
const MAX_WINDOW_SECS: i64 = 100 * 365 * 24 * 60 * 60;

const BLOCK_PREFIX: &str = "We've detected unusual activity on your account. ";

/// Spam scorer engine
#[derive(Debug, Clone)]
pub struct SpamScorer {
    config: SpamConfig,
}

impl SpamScorer {
    /// Create a new spam scorer
    pub fn new(config: SpamConfig) -> Self {
        Self { config }
    }

    /// Get current config
    pub fn config(&self) -> &SpamConfig {
        &self.config
    }

    /// Derive behavioral stats from a history as seen at `now`
    pub fn stats(&self, history: &PrayerHistory, now: DateTime<Utc>) -> UserPrayerStats {
        let account_age_days = match history.account_created_at {
            Some(created_at) => {
                now.signed_duration_since(created_at).num_milliseconds() as f64
                    / Duration::days(1).num_milliseconds() as f64
            }
            None => self.config.missing_account_age_days,
        };

        let recent_cutoff = cutoff(now, self.config.recent_window_secs);
        let rapid_cutoff = cutoff(now, self.config.rapid_fire_window_secs);

        let mut recent = 0u32;
        let mut rapid = 0u32;
        let mut prayed = 0u32;

        for commitment in &history.commitments {
            if commitment.committed_at > recent_cutoff {
                recent += 1;
            }
            if commitment.committed_at > rapid_cutoff {
                rapid += 1;
            }
            if commitment.status == CommitmentStatus::Prayed {
                prayed += 1;
            }
        }

        let total = history.commitments.len() as u32;
        let confirmation_ratio_pct = if total > 0 {
            f64::from(prayed) / f64::from(total) * 100.0
        } else {
            // Benefit of the doubt for users with no history
            100.0
        };

        UserPrayerStats {
            account_age_days,
            recent_commitments_5min: recent,
            rapid_fire_commitments_10s: rapid,
            total_commitments: total,
            prayed_confirmations: prayed,
            confirmation_ratio_pct,
        }
    }

    /// Risk factors triggered by the stats, in evaluation order
    pub fn risk_factors(&self, stats: &UserPrayerStats) -> Vec<RiskFactor> {
        let config = &self.config;
        let mut factors = Vec::new();

        if stats.account_age_days < config.new_account_days {
            factors.push(RiskFactor::NewAccount);
        }

        if stats.recent_commitments_5min >= config.recent_limit {
            factors.push(RiskFactor::TooManyRecent);
        }

        if stats.rapid_fire_commitments_10s >= config.rapid_fire_limit {
            factors.push(RiskFactor::RapidFire);
        }

        if stats.total_commitments >= config.min_commitments_for_ratio
            && stats.confirmation_ratio_pct < config.min_confirmation_ratio
        {
            factors.push(RiskFactor::LowConfirmation);
        }

        factors
    }

    /// Points contributed by a single factor
    pub fn points(&self, factor: RiskFactor) -> u32 {
        match factor {
            RiskFactor::NewAccount => self.config.new_account_points,
            RiskFactor::TooManyRecent => self.config.recent_points,
            RiskFactor::RapidFire => self.config.rapid_fire_points,
            RiskFactor::LowConfirmation => self.config.low_confirmation_points,
        }
    }

    /// Score the stats and decide
    pub fn evaluate(&self, stats: &UserPrayerStats) -> SpamCheckResult {
        let factors = self.risk_factors(stats);
        let score: u32 = factors.iter().map(|f| self.points(*f)).sum();

        if score >= self.config.block_threshold {
            SpamCheckResult {
                allowed: false,
                score,
                reason: Some(block_message(&factors)),
                warning_level: WarningLevel::High,
            }
        } else if score >= self.config.warn_threshold {
            SpamCheckResult {
                allowed: true,
                score,
                reason: Some(warning_message(&factors)),
                warning_level: WarningLevel::Low,
            }
        } else {
            SpamCheckResult {
                allowed: true,
                score,
                reason: None,
                warning_level: WarningLevel::None,
            }
        }
    }

    /// Compute stats and evaluate in one step
    pub fn score(&self, history: &PrayerHistory, now: DateTime<Utc>) -> SpamCheckResult {
        self.evaluate(&self.stats(history, now))
    }
}

impl Default for SpamScorer {
    fn default() -> Self {
        Self::new(SpamConfig::default())
    }
}

/// Start of a trailing window; commitments must be strictly newer to count
fn cutoff(now: DateTime<Utc>, window_secs: u64) -> DateTime<Utc> {
    let secs = i64::try_from(window_secs)
        .unwrap_or(i64::MAX)
        .min(MAX_WINDOW_SECS);
    now.checked_sub_signed(Duration::seconds(secs))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Most severe factor present, following [`RiskFactor::PRIORITY`]
fn dominant_factor(factors: &[RiskFactor]) -> Option<RiskFactor> {
    RiskFactor::PRIORITY
        .into_iter()
        .find(|candidate| factors.contains(candidate))
}

/// User-facing message for a blocked commitment
pub fn block_message(factors: &[RiskFactor]) -> String {
    match dominant_factor(factors) {
        Some(RiskFactor::RapidFire) => format!(
            "{}Please slow down and take time to genuinely commit to pray for each request.",
            BLOCK_PREFIX
        ),
        Some(RiskFactor::TooManyRecent) => format!(
            "{}You've made many prayer commitments recently. Please take a moment to pray for the requests you've already committed to.",
            BLOCK_PREFIX
        ),
        Some(RiskFactor::LowConfirmation) => format!(
            "{}We noticed you haven't been confirming your prayers. Please remember to click 'I Prayed' after you've prayed for a request.",
            BLOCK_PREFIX
        ),
        Some(RiskFactor::NewAccount) => "New accounts are limited to 3 prayer commitments per day. Keep engaging with the community to unlock full access!".to_string(),
        None => format!(
            "{}Please contact support if you believe this is an error.",
            BLOCK_PREFIX
        ),
    }
}

/// Encouraging message for a commitment that is allowed with a warning
pub fn warning_message(factors: &[RiskFactor]) -> String {
    let message = match dominant_factor(factors) {
        Some(RiskFactor::RapidFire) => "You're committing very quickly! Please slow down and take time to genuinely pray for each request.",
        Some(RiskFactor::TooManyRecent) => "You're committing to pray for many requests! Remember to take time to actually pray for each one.",
        Some(RiskFactor::LowConfirmation) => "Reminder: Don't forget to confirm when you've prayed for a request by clicking 'I Prayed'!",
        Some(RiskFactor::NewAccount) => "Welcome! As a new member, please take your time and genuinely commit to pray for each request.",
        None => "Thank you for your prayer commitments! Remember to confirm when you've prayed.",
    };
    message.to_string()
}

use chrono::{DateTime, Utc};

use crate::config::EngineConfig;

/// What a learner currently holds toward unlocking a locked question bank.
#[derive(Debug, Clone, Default)]
pub struct Entitlements {
    pub referral_count: u32,
    pub membership_until: Option<DateTime<Utc>>,
}

impl Entitlements {
    pub fn has_active_membership(&self, now: DateTime<Utc>) -> bool {
        self.membership_until.map_or(false, |until| until > now)
    }
}

/// Access decision for one position in a locked bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Granted,
    /// Locked; unlocks once this many further referrals are earned, or a
    /// membership is bought.
    ReferralsNeeded(u32),
}

impl AccessDecision {
    pub fn is_granted(&self) -> bool {
        matches!(self, AccessDecision::Granted)
    }
}

/// The first `free_question_limit` positions are a free preview; beyond
/// that, an active membership or the referral threshold unlocks the bank.
pub fn check_access(
    question_index: usize,
    entitlements: &Entitlements,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> AccessDecision {
    if question_index < config.free_question_limit as usize {
        return AccessDecision::Granted;
    }
    if entitlements.has_active_membership(now) {
        return AccessDecision::Granted;
    }
    if entitlements.referral_count >= config.referral_unlock_threshold {
        return AccessDecision::Granted;
    }
    AccessDecision::ReferralsNeeded(
        config.referral_unlock_threshold - entitlements.referral_count,
    )
}

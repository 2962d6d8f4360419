use serde::{Deserialize, Serialize};

use super::aggregate::{StreakState, UserAggregate};
use super::badge::UserBadge;
use super::quest::Week7Quest;

/// Position on the level table for a given XP total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelInfo {
    pub level: u32,
    /// 0 once the top level is reached.
    pub xp_to_next_level: u64,
    pub tier: String,
}

/// What a single logged activity did to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityOutcome {
    pub user_id: String,
    pub xp_awarded: u64,
    pub base_xp: u64,
    pub consistency_bonus: u64,
    pub week7_bonus: u64,
    pub total_xp: u64,
    pub level: u32,
    pub leveled_up: bool,
    pub streak: StreakState,
    pub quest: Week7Quest,
    pub badges_unlocked: Vec<UserBadge>,
    /// Badge evaluation failed after the XP commit; no badges this cycle.
    pub badge_check_degraded: bool,
}

/// Aggregate snapshot for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    pub aggregate: UserAggregate,
    pub level: LevelInfo,
    /// False when the user has never logged an activity.
    pub persisted: bool,
}

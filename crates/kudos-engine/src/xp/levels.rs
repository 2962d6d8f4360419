//! Level table: 10 named tiers of 5 levels each.
//!
//! Advancing from a level inside tier `t` (0-based) costs `100 × (t + 1)` XP,
//! so tier 0 levels cost 100 each and tier 9 levels cost 1000 each.

use kudos_core::LevelInfo;

pub const TIER_NAMES: [&str; 10] = [
    "Novice",
    "Apprentice",
    "Learner",
    "Scholar",
    "Adept",
    "Expert",
    "Master",
    "Sage",
    "Luminary",
    "Legend",
];

pub const LEVELS_PER_TIER: u32 = 5;
pub const MAX_LEVEL: u32 = TIER_NAMES.len() as u32 * LEVELS_PER_TIER;

/// 0-based tier of a 1-based level.
fn tier_of(level: u32) -> usize {
    ((level.clamp(1, MAX_LEVEL) - 1) / LEVELS_PER_TIER) as usize
}

/// XP needed to go from `level` to `level + 1`.
fn cost_of(level: u32) -> u64 {
    100 * (tier_of(level) as u64 + 1)
}

pub fn level_for(total_xp: u64) -> LevelInfo {
    let mut level = 1;
    let mut floor = 0u64;
    while level < MAX_LEVEL {
        let next = floor + cost_of(level);
        if total_xp < next {
            return LevelInfo {
                level,
                xp_to_next_level: next - total_xp,
                tier: TIER_NAMES[tier_of(level)].to_string(),
            };
        }
        floor = next;
        level += 1;
    }
    LevelInfo {
        level: MAX_LEVEL,
        xp_to_next_level: 0,
        tier: TIER_NAMES[tier_of(MAX_LEVEL)].to_string(),
    }
}

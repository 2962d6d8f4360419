//! Bonus stacking: base → weekly consistency multiplier → quest doubling.
//! Each stage floors to an integer before the next.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusBreakdown {
    pub base_xp: u64,
    pub consistency_bonus: u64,
    /// XP before quest doubling; the doubling adds exactly this much.
    pub week7_bonus: u64,
    pub xp_awarded: u64,
}

pub fn stack(base_xp: u64, bonus_active: bool, bonus_multiplier: f64, quest_active: bool) -> BonusBreakdown {
    let mut xp = base_xp;

    let mut consistency_bonus = 0;
    if bonus_active && bonus_multiplier > 1.0 {
        let boosted = (xp as f64 * bonus_multiplier).floor() as u64;
        consistency_bonus = boosted.saturating_sub(xp);
        xp = boosted;
    }

    let mut week7_bonus = 0;
    if quest_active && base_xp > 0 {
        week7_bonus = xp;
        xp = xp.saturating_mul(2);
    }

    BonusBreakdown {
        base_xp,
        consistency_bonus,
        week7_bonus,
        xp_awarded: xp,
    }
}

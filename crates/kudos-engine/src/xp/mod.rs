//! XP: base amounts per activity, bonus stacking, and the level table.

pub mod calculator;
pub mod levels;
pub mod stacker;

pub use calculator::XpCalculator;
pub use levels::{level_for, LEVELS_PER_TIER, MAX_LEVEL, TIER_NAMES};
pub use stacker::{stack, BonusBreakdown};

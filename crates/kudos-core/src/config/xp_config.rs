use serde::{Deserialize, Serialize};

/// XP calculation and bonus settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct XpConfig {
    /// Upper clamp for base XP of a single activity.
    pub max_xp_per_activity: u64,
    /// Multiplier granted once all tracked categories are completed in a week.
    pub weekly_bonus_multiplier: f64,
}

impl Default for XpConfig {
    fn default() -> Self {
        Self {
            max_xp_per_activity: 1000,
            weekly_bonus_multiplier: 1.5,
        }
    }
}

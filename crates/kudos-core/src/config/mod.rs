pub mod maintenance_config;
pub mod quest_config;
pub mod storage_config;
pub mod streak_config;
pub mod updater_config;
pub mod xp_config;

use serde::{Deserialize, Serialize};

use crate::errors::{KudosError, KudosResult};

pub use maintenance_config::MaintenanceConfig;
pub use quest_config::{QuestConfig, QuestRequirements};
pub use storage_config::StorageConfig;
pub use streak_config::StreakConfig;
pub use updater_config::UpdaterConfig;
pub use xp_config::XpConfig;

/// Top-level configuration aggregating all subsystem configs.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct KudosConfig {
    pub storage: StorageConfig,
    pub xp: XpConfig,
    pub streak: StreakConfig,
    pub updater: UpdaterConfig,
    pub maintenance: MaintenanceConfig,
    pub quest: QuestConfig,
}

impl KudosConfig {
    /// Load config from a TOML string, falling back to defaults for missing fields.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Load and validate config from a TOML file on disk.
    pub fn load(path: &std::path::Path) -> KudosResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| KudosError::Config(format!("read {}: {e}", path.display())))?;
        let config = Self::from_toml(&raw)
            .map_err(|e| KudosError::Config(format!("parse {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would break engine invariants.
    pub fn validate(&self) -> KudosResult<()> {
        if self.xp.weekly_bonus_multiplier < 1.0 || !self.xp.weekly_bonus_multiplier.is_finite() {
            return Err(KudosError::Config(format!(
                "xp.weekly_bonus_multiplier must be a finite value >= 1.0, got {}",
                self.xp.weekly_bonus_multiplier
            )));
        }
        if self.maintenance.batch_size == 0 {
            return Err(KudosError::Config("maintenance.batch_size must be > 0".into()));
        }
        if self.maintenance.workers == 0 {
            return Err(KudosError::Config("maintenance.workers must be > 0".into()));
        }
        self.maintenance.run_at_time()?;
        self.streak.utc_offset()?;
        if self.updater.store_timeout_ms == 0 {
            return Err(KudosError::Config("updater.store_timeout_ms must be > 0".into()));
        }
        if self.quest.duration_days == 0 {
            return Err(KudosError::Config("quest.duration_days must be > 0".into()));
        }
        if self.streak.freeze_award_interval_days == 0 {
            return Err(KudosError::Config(
                "streak.freeze_award_interval_days must be > 0".into(),
            ));
        }
        Ok(())
    }
}

//! Streak maintenance job configuration.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::errors::{KudosError, KudosResult};

/// Configuration for the daily streak maintenance job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceConfig {
    /// Whether the scheduler loop runs at all. Manual runs are always allowed.
    pub enabled: bool,
    /// Local wall-clock time of the daily run, "HH:MM".
    pub run_at: String,
    /// Users loaded per page.
    pub batch_size: usize,
    /// Concurrent per-user transactions inside one batch.
    pub workers: usize,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            run_at: "00:05".to_string(),
            batch_size: 100,
            workers: 8,
        }
    }
}

impl MaintenanceConfig {
    pub fn run_at_time(&self) -> KudosResult<NaiveTime> {
        NaiveTime::parse_from_str(&self.run_at, "%H:%M").map_err(|e| {
            KudosError::Config(format!("maintenance.run_at `{}` is not HH:MM: {e}", self.run_at))
        })
    }
}

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Retry and timeout settings for optimistic read-modify-write cycles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdaterConfig {
    /// Retries after the first attempt when a commit hits a version conflict.
    pub max_retries: u32,
    pub base_backoff_ms: u64,
    pub max_backoff_ms: u64,
    /// Upper bound for any single store round-trip.
    pub store_timeout_ms: u64,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_backoff_ms: 25,
            max_backoff_ms: 400,
            store_timeout_ms: 10_000,
        }
    }
}

impl UpdaterConfig {
    /// Exponential backoff for the given retry (0-based), capped at `max_backoff_ms`.
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let factor = 1u64.checked_shl(retry.min(20)).unwrap_or(u64::MAX);
        let ms = self.base_backoff_ms.saturating_mul(factor).min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

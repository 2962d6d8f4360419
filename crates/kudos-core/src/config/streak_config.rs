use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{KudosError, KudosResult};

/// Daily streak settings and the local calendar used for day/week boundaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreakConfig {
    /// A freeze is granted every N consecutive days.
    pub freeze_award_interval_days: u32,
    /// Maximum freezes a user can hold.
    pub max_freezes: u32,
    /// Offset of the engine's local day from UTC, in minutes (e.g. -480 for PST).
    pub utc_offset_minutes: i32,
}

impl Default for StreakConfig {
    fn default() -> Self {
        Self {
            freeze_award_interval_days: 7,
            max_freezes: 3,
            utc_offset_minutes: 0,
        }
    }
}

impl StreakConfig {
    pub fn utc_offset(&self) -> KudosResult<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes.saturating_mul(60)).ok_or_else(|| {
            KudosError::Config(format!(
                "streak.utc_offset_minutes out of range: {}",
                self.utc_offset_minutes
            ))
        })
    }

    /// Local calendar date of an instant. Out-of-range offsets fall back to UTC
    /// (`validate()` rejects them at startup).
    pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        match self.utc_offset() {
            Ok(offset) => at.with_timezone(&offset).date_naive(),
            Err(_) => at.date_naive(),
        }
    }

    /// Monday of the local week containing `date`.
    pub fn week_start(date: NaiveDate) -> NaiveDate {
        date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
    }
}

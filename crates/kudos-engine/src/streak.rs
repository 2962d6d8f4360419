//! Streak and weekly-consistency rules.
//!
//! Two entry points mutate streak state: an activity on a given local day, and
//! the daily maintenance pass. Both are pure functions over the aggregate's
//! fields so the updater and the job apply identical rules.

use chrono::{Duration, NaiveDate};
use kudos_core::config::StreakConfig;
use kudos_core::{ActivityCategory, StreakState, WeeklyProgress};

/// What an activity did to the streak.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreakChange {
    pub extended: bool,
    pub reset: bool,
    pub freeze_awarded: bool,
}

/// Count an activity on `today`.
///
/// Same day: unchanged. Day after the last covered day (activity or freeze):
/// +1. Anything else starts over at 1.
pub fn record_activity(streak: &mut StreakState, today: NaiveDate, config: &StreakConfig) -> StreakChange {
    let mut change = StreakChange::default();

    if streak.last_activity_date == Some(today) {
        return change;
    }

    match streak.last_covered_day() {
        Some(last) if last >= today => {
            // Covered by a freeze through today, or an out-of-order event.
            if streak.current_count == 0 {
                streak.current_count = 1;
                change.reset = true;
            }
        }
        Some(last) if last == today - Duration::days(1) && streak.current_count > 0 => {
            streak.current_count += 1;
            change.extended = true;
        }
        _ => {
            streak.current_count = 1;
            change.reset = true;
        }
    }

    streak.last_activity_date = Some(streak.last_activity_date.map_or(today, |d| d.max(today)));
    streak.longest_count = streak.longest_count.max(streak.current_count);

    let interval = config.freeze_award_interval_days.max(1);
    if change.extended
        && streak.current_count % interval == 0
        && streak.freeze_count < config.max_freezes
    {
        streak.freeze_count += 1;
        change.freeze_awarded = true;
    }

    change
}

/// Outcome of the daily pass over one streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailyStreakOutcome {
    Unchanged,
    FreezeConsumed,
    Broken,
}

/// Daily pass: a streak whose last covered day is before yesterday either
/// burns a freeze (covering yesterday) or breaks. Longest is preserved.
pub fn apply_daily(streak: &mut StreakState, today: NaiveDate) -> DailyStreakOutcome {
    if streak.current_count == 0 {
        return DailyStreakOutcome::Unchanged;
    }
    let yesterday = today - Duration::days(1);
    match streak.last_covered_day() {
        Some(last) if last >= yesterday => DailyStreakOutcome::Unchanged,
        _ if streak.freeze_count > 0 => {
            streak.freeze_count -= 1;
            streak.frozen_through = Some(yesterday);
            DailyStreakOutcome::FreezeConsumed
        }
        _ => {
            streak.current_count = 0;
            DailyStreakOutcome::Broken
        }
    }
}

/// Clear weekly progress and the consistency bonus if `today` falls in a later
/// week than the one recorded. Returns whether anything was reset.
pub fn roll_week(weekly: &mut WeeklyProgress, streak: &mut StreakState, today: NaiveDate) -> bool {
    let current = StreakConfig::week_start(today);
    match weekly.week_start {
        Some(start) if start >= current => false,
        None if weekly.categories.is_empty() && !streak.bonus_active => {
            weekly.week_start = Some(current);
            false
        }
        _ => {
            weekly.week_start = Some(current);
            weekly.categories.clear();
            streak.bonus_active = false;
            streak.bonus_multiplier = 1.0;
            true
        }
    }
}

/// Record a completed category for the current week. Activates the bonus
/// when all four categories are in. Returns true on activation.
///
/// A late event dated in an earlier week than the recorded one is ignored.
pub fn record_category(
    weekly: &mut WeeklyProgress,
    streak: &mut StreakState,
    category: ActivityCategory,
    today: NaiveDate,
    multiplier: f64,
) -> bool {
    roll_week(weekly, streak, today);
    if weekly
        .week_start
        .is_some_and(|start| StreakConfig::week_start(today) < start)
    {
        return false;
    }
    weekly.categories.insert(category);
    if weekly.is_complete() && !streak.bonus_active {
        streak.bonus_active = true;
        streak.bonus_multiplier = multiplier;
        return true;
    }
    false
}

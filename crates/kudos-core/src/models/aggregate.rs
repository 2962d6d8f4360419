use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::activity::{Activity, ActivityCategory};
use super::quest::Week7Quest;

/// Consecutive-day activity streak plus the weekly consistency bonus state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreakState {
    pub current_count: u32,
    pub longest_count: u32,
    pub last_activity_date: Option<NaiveDate>,
    pub freeze_count: u32,
    pub bonus_active: bool,
    pub bonus_multiplier: f64,
    /// Last day covered by a consumed freeze.
    pub frozen_through: Option<NaiveDate>,
}

impl Default for StreakState {
    fn default() -> Self {
        Self {
            current_count: 0,
            longest_count: 0,
            last_activity_date: None,
            freeze_count: 0,
            bonus_active: false,
            bonus_multiplier: 1.0,
            frozen_through: None,
        }
    }
}

impl StreakState {
    /// Most recent day the streak is accounted for, activity or freeze.
    pub fn last_covered_day(&self) -> Option<NaiveDate> {
        match (self.last_activity_date, self.frozen_through) {
            (Some(a), Some(f)) => Some(a.max(f)),
            (a, f) => a.or(f),
        }
    }
}

/// Lifetime activity counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityCounters {
    pub flashcards_reviewed: u64,
    pub flashcard_sets: u64,
    pub quizzes_passed: u64,
    pub evaluations_submitted: u64,
    pub guides_completed: u64,
    pub study_time_minutes: u64,
}

impl ActivityCounters {
    /// Bump the counters touched by `activity`. Unrecognized activities are a no-op.
    pub fn apply(&mut self, activity: &Activity) {
        match activity {
            Activity::FlashcardReview { cards_reviewed } => {
                self.flashcards_reviewed =
                    self.flashcards_reviewed.saturating_add(u64::from(*cards_reviewed));
                self.flashcard_sets = self.flashcard_sets.saturating_add(1);
            }
            Activity::QuizPassed { .. } => {
                self.quizzes_passed = self.quizzes_passed.saturating_add(1);
            }
            Activity::EvaluationSubmitted { .. } => {
                self.evaluations_submitted = self.evaluations_submitted.saturating_add(1);
            }
            Activity::GuideCompleted => {
                self.guides_completed = self.guides_completed.saturating_add(1);
            }
            Activity::StudySession { minutes } => {
                self.study_time_minutes =
                    self.study_time_minutes.saturating_add(u64::from(*minutes));
            }
            Activity::Unrecognized { .. } => {}
        }
    }
}

/// Categories completed during the current local week.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeeklyProgress {
    /// Monday of the week the categories belong to.
    pub week_start: Option<NaiveDate>,
    pub categories: BTreeSet<ActivityCategory>,
}

impl WeeklyProgress {
    pub fn is_complete(&self) -> bool {
        ActivityCategory::ALL
            .iter()
            .all(|c| self.categories.contains(c))
    }
}

/// Per-user gamification document. The unit of every optimistic transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAggregate {
    pub user_id: String,
    #[serde(default)]
    pub course_id: Option<String>,
    #[serde(default)]
    pub total_xp: u64,
    #[serde(default = "first_level")]
    pub level: u32,
    #[serde(default)]
    pub xp_to_next_level: u64,
    #[serde(default)]
    pub streak: StreakState,
    #[serde(default)]
    pub activities: ActivityCounters,
    #[serde(default)]
    pub weekly: WeeklyProgress,
    #[serde(default)]
    pub week7_quest: Week7Quest,
    /// Mirror of the badge table. Never consulted for "already earned".
    #[serde(default)]
    pub earned_badge_ids: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn first_level() -> u32 {
    1
}

impl UserAggregate {
    /// Zero state for a user seen for the first time.
    ///
    /// `xp_to_next_level` is left at 0; callers derive it from the level table.
    pub fn new(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            course_id: None,
            total_xp: 0,
            level: 1,
            xp_to_next_level: 0,
            streak: StreakState::default(),
            activities: ActivityCounters::default(),
            weekly: WeeklyProgress::default(),
            week7_quest: Week7Quest::default(),
            earned_badge_ids: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::QuestRequirements;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
    #[default]
    Inactive,
    Active,
    Completed,
    Deactivated,
}

/// The week-7 exam-readiness quest embedded in each aggregate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Week7Quest {
    pub status: QuestStatus,
    pub course_id: Option<String>,
    pub exam_readiness_percent: u8,
    pub boss_battle_completed: bool,
    pub double_xp_earned: u64,
    pub activated_on: Option<NaiveDate>,
    pub expires_on: Option<NaiveDate>,
}

impl Week7Quest {
    pub fn active(&self) -> bool {
        self.status == QuestStatus::Active
    }

    /// Whether an event for `course_id` is covered by the running quest.
    pub fn applies_to(&self, course_id: Option<&str>) -> bool {
        self.active() && course_id.is_some() && self.course_id.as_deref() == course_id
    }
}

/// Result of an activation attempt. Rejections are normal outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum QuestActivation {
    Activated { quest: Week7Quest },
    Rejected { reason: String },
}

impl QuestActivation {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    pub fn is_activated(&self) -> bool {
        matches!(self, Self::Activated { .. })
    }
}

/// Read-side quest view with the per-category breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestProgress {
    pub quest: Week7Quest,
    pub flashcards_percent: u8,
    pub quizzes_percent: u8,
    pub evaluations_percent: u8,
    pub guides_percent: u8,
    pub readiness_percent: u8,
    pub requirements: QuestRequirements,
}

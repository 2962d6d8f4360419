//! Exam-readiness quest configuration.

use serde::{Deserialize, Serialize};

/// Per-category activity counts that make up 100% readiness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestRequirements {
    pub flashcards: u64,
    pub quizzes: u64,
    pub evaluations: u64,
    pub guides: u64,
}

impl Default for QuestRequirements {
    fn default() -> Self {
        Self {
            flashcards: 50,
            quizzes: 5,
            evaluations: 3,
            guides: 2,
        }
    }
}

/// Configuration for the week-7 readiness quest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestConfig {
    /// Course week in which the quest may be activated.
    pub quest_week: u32,
    /// Days the quest stays active before the daily job expires it.
    pub duration_days: u32,
    pub requirements: QuestRequirements,
}

impl Default for QuestConfig {
    fn default() -> Self {
        Self {
            quest_week: 7,
            duration_days: 7,
            requirements: QuestRequirements::default(),
        }
    }
}

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{KudosError, KudosResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeCategory {
    Streak,
    Xp,
    Activity,
    Special,
}

impl BadgeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Streak => "streak",
            Self::Xp => "xp",
            Self::Activity => "activity",
            Self::Special => "special",
        }
    }

    pub fn parse(s: &str) -> KudosResult<Self> {
        match s {
            "streak" => Ok(Self::Streak),
            "xp" => Ok(Self::Xp),
            "activity" => Ok(Self::Activity),
            "special" => Ok(Self::Special),
            other => Err(KudosError::Validation(format!(
                "unknown badge category `{other}`"
            ))),
        }
    }
}

/// Counter thresholds. Every present field must be met.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityThresholds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flashcards_reviewed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flashcard_sets: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quizzes_passed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluations_submitted: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guides_completed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_time_minutes: Option<u64>,
}

impl ActivityThresholds {
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// `(counter name, required)` for every present threshold.
    pub fn entries(&self) -> Vec<(&'static str, u64)> {
        [
            ("flashcards_reviewed", self.flashcards_reviewed),
            ("flashcard_sets", self.flashcard_sets),
            ("quizzes_passed", self.quizzes_passed),
            ("evaluations_submitted", self.evaluations_submitted),
            ("guides_completed", self.guides_completed),
            ("study_time_minutes", self.study_time_minutes),
        ]
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k, v)))
        .collect()
    }

    fn slot(&mut self, key: &str) -> Option<&mut Option<u64>> {
        match key {
            "flashcards_reviewed" => Some(&mut self.flashcards_reviewed),
            "flashcard_sets" => Some(&mut self.flashcard_sets),
            "quizzes_passed" => Some(&mut self.quizzes_passed),
            "evaluations_submitted" => Some(&mut self.evaluations_submitted),
            "guides_completed" => Some(&mut self.guides_completed),
            "study_time_minutes" => Some(&mut self.study_time_minutes),
            _ => None,
        }
    }
}

/// Unlock condition for a badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BadgeCriteria {
    TotalXp { min_xp: u64 },
    /// Compared against the longest streak ever reached.
    StreakDays { min_days: u32 },
    ActivityThresholds(ActivityThresholds),
    JoinedBefore { cutoff: DateTime<Utc> },
    QuestCompleted,
}

fn non_negative(key: &str, value: &serde_json::Value) -> KudosResult<u64> {
    value.as_u64().ok_or_else(|| {
        KudosError::Validation(format!(
            "criteria key `{key}` needs a non-negative integer, got {value}"
        ))
    })
}

impl BadgeCriteria {
    /// Build criteria from a legacy `{key: threshold}` map.
    ///
    /// Keys from different criteria kinds cannot be mixed. Unknown keys are
    /// rejected so a misspelled threshold never silently unlocks a badge.
    pub fn from_threshold_map(map: &BTreeMap<String, serde_json::Value>) -> KudosResult<Self> {
        if map.is_empty() {
            return Err(KudosError::Validation("empty badge criteria".into()));
        }

        let mut thresholds = ActivityThresholds::default();
        let mut other: Option<BadgeCriteria> = None;
        let mut set_other = |c: BadgeCriteria, key: &str| -> KudosResult<()> {
            if other.replace(c).is_some() {
                return Err(KudosError::Validation(format!(
                    "criteria key `{key}` cannot be combined with other keys"
                )));
            }
            Ok(())
        };

        for (key, value) in map {
            match key.as_str() {
                "total_xp" => set_other(
                    BadgeCriteria::TotalXp {
                        min_xp: non_negative(key, value)?,
                    },
                    key,
                )?,
                "streak_days" => {
                    let days = non_negative(key, value)?;
                    let min_days = u32::try_from(days).map_err(|_| {
                        KudosError::Validation(format!("streak_days {days} out of range"))
                    })?;
                    set_other(BadgeCriteria::StreakDays { min_days }, key)?
                }
                "joined_before" => {
                    let raw = value.as_str().ok_or_else(|| {
                        KudosError::Validation("joined_before needs an RFC 3339 string".into())
                    })?;
                    let cutoff = DateTime::parse_from_rfc3339(raw)
                        .map_err(|e| {
                            KudosError::Validation(format!("joined_before `{raw}`: {e}"))
                        })?
                        .with_timezone(&Utc);
                    set_other(BadgeCriteria::JoinedBefore { cutoff }, key)?
                }
                "quest_completed" => {
                    if value.as_bool() != Some(true) {
                        return Err(KudosError::Validation(
                            "quest_completed must be `true`".into(),
                        ));
                    }
                    set_other(BadgeCriteria::QuestCompleted, key)?
                }
                k => {
                    let required = non_negative(k, value)?;
                    match thresholds.slot(k) {
                        Some(slot) => *slot = Some(required),
                        None => {
                            return Err(KudosError::Validation(format!(
                                "unknown badge criteria key `{k}`"
                            )))
                        }
                    }
                }
            }
        }

        match (other, thresholds.is_empty()) {
            (Some(c), true) => Ok(c),
            (None, false) => Ok(BadgeCriteria::ActivityThresholds(thresholds)),
            (Some(_), false) => Err(KudosError::Validation(
                "activity thresholds cannot be combined with other criteria keys".into(),
            )),
            (None, true) => Err(KudosError::Validation("empty badge criteria".into())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeDefinition {
    pub badge_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: BadgeCategory,
    pub criteria: BadgeCriteria,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl BadgeDefinition {
    pub fn new(
        badge_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        category: BadgeCategory,
        criteria: BadgeCriteria,
    ) -> Self {
        Self {
            badge_id: badge_id.into(),
            name: name.into(),
            description: description.into(),
            category,
            criteria,
            active: true,
        }
    }
}

/// A badge a user has earned. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBadge {
    pub user_id: String,
    pub badge_id: String,
    pub earned_at: DateTime<Utc>,
}

/// One numeric component of a badge's criteria.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionProgress {
    pub key: String,
    pub current: u64,
    pub required: u64,
    pub percent: u8,
}

/// Progress towards a locked badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeProgress {
    pub badge_id: String,
    pub name: String,
    pub category: BadgeCategory,
    /// Mean of the component percentages.
    pub percent: u8,
    pub components: Vec<CriterionProgress>,
}

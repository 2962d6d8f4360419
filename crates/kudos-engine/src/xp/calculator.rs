//! Base XP for a single activity, before any bonus.

use kudos_core::models::{Activity, QuizDifficulty};
use kudos_core::KudosResult;
use tracing::warn;

const FLASHCARD_XP_PER_BLOCK: u64 = 5;
const FLASHCARD_BLOCK: u64 = 10;
const STUDY_XP_PER_BLOCK: u64 = 2;
const STUDY_BLOCK_MINUTES: u64 = 5;
const GUIDE_XP: u64 = 30;

#[derive(Debug, Clone, Copy)]
pub struct XpCalculator {
    max_xp_per_activity: u64,
}

impl XpCalculator {
    pub fn new(max_xp_per_activity: u64) -> Self {
        Self {
            max_xp_per_activity,
        }
    }

    /// Parse and score in one step. Malformed payloads fail here, before any
    /// store access.
    pub fn evaluate(
        &self,
        user_id: &str,
        activity_type: &str,
        payload: &serde_json::Value,
    ) -> KudosResult<(Activity, u64)> {
        let activity = Activity::parse(activity_type, payload)?;
        if !activity.is_recognized() {
            warn!(user_id, activity_type, "unrecognized activity type, awarding 0 XP");
        }
        let xp = self.base_xp(&activity);
        Ok((activity, xp))
    }

    /// Base XP clamped to `[0, max_xp_per_activity]`.
    pub fn base_xp(&self, activity: &Activity) -> u64 {
        let raw = match activity {
            Activity::FlashcardReview { cards_reviewed } => {
                u64::from(*cards_reviewed) / FLASHCARD_BLOCK * FLASHCARD_XP_PER_BLOCK
            }
            Activity::QuizPassed { difficulty } => match difficulty {
                QuizDifficulty::Easy => 10,
                QuizDifficulty::Medium => 15,
                QuizDifficulty::Hard => 25,
            },
            Activity::EvaluationSubmitted { score } => match score {
                0..=3 => 10,
                4..=6 => 25,
                _ => 50,
            },
            Activity::GuideCompleted => GUIDE_XP,
            Activity::StudySession { minutes } => {
                u64::from(*minutes) / STUDY_BLOCK_MINUTES * STUDY_XP_PER_BLOCK
            }
            Activity::Unrecognized { .. } => 0,
        };
        raw.min(self.max_xp_per_activity)
    }
}

impl Default for XpCalculator {
    fn default() -> Self {
        Self::new(1000)
    }
}

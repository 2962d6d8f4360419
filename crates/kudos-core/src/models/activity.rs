//! Activity events: the raw input envelope and its typed interpretation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{KudosError, KudosResult};

/// Upper bounds on payload values. Anything above is malformed or adversarial.
const MAX_CARDS_PER_REVIEW: u32 = 10_000;
const MAX_STUDY_MINUTES: u32 = 24 * 60;
const MAX_EVALUATION_SCORE: u8 = 10;

/// Ephemeral input: one learning activity reported by a collaborator.
/// Not persisted by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub user_id: String,
    pub course_id: Option<String>,
    pub activity_type: String,
    #[serde(default)]
    pub payload: serde_json::Value,
    pub occurred_at: DateTime<Utc>,
}

impl ActivityEvent {
    pub fn new(
        user_id: impl Into<String>,
        course_id: Option<String>,
        activity_type: impl Into<String>,
        payload: serde_json::Value,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            course_id,
            activity_type: activity_type.into(),
            payload,
            occurred_at,
        }
    }
}

/// Difficulty of a passed quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizDifficulty {
    Easy,
    Medium,
    Hard,
}

/// The four categories that count towards the weekly consistency bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityCategory {
    Flashcards,
    Quiz,
    Evaluation,
    Guide,
}

impl ActivityCategory {
    pub const ALL: [ActivityCategory; 4] = [
        ActivityCategory::Flashcards,
        ActivityCategory::Quiz,
        ActivityCategory::Evaluation,
        ActivityCategory::Guide,
    ];
}

/// Typed view of an activity after payload validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activity {
    FlashcardReview { cards_reviewed: u32 },
    QuizPassed { difficulty: QuizDifficulty },
    EvaluationSubmitted { score: u8 },
    GuideCompleted,
    StudySession { minutes: u32 },
    /// Unknown activity type. Worth 0 XP, touches no counters.
    Unrecognized { activity_type: String },
}

#[derive(Deserialize)]
struct FlashcardPayload {
    cards_reviewed: u32,
}

#[derive(Deserialize)]
struct QuizPayload {
    difficulty: QuizDifficulty,
}

#[derive(Deserialize)]
struct EvaluationPayload {
    score: u8,
}

#[derive(Deserialize)]
struct StudyPayload {
    minutes: u32,
}

fn payload<T: serde::de::DeserializeOwned>(
    activity_type: &str,
    value: &serde_json::Value,
) -> KudosResult<T> {
    serde_json::from_value(value.clone()).map_err(|e| {
        KudosError::Validation(format!("malformed `{activity_type}` payload: {e}"))
    })
}

impl Activity {
    /// Validate the raw `(activity_type, payload)` pair.
    ///
    /// Unknown types are not an error; malformed payloads of known types are.
    pub fn parse(activity_type: &str, value: &serde_json::Value) -> KudosResult<Self> {
        match activity_type {
            "flashcard_review" => {
                let p: FlashcardPayload = payload(activity_type, value)?;
                if p.cards_reviewed > MAX_CARDS_PER_REVIEW {
                    return Err(KudosError::Validation(format!(
                        "cards_reviewed {} exceeds {MAX_CARDS_PER_REVIEW}",
                        p.cards_reviewed
                    )));
                }
                Ok(Self::FlashcardReview {
                    cards_reviewed: p.cards_reviewed,
                })
            }
            "quiz_passed" => {
                let p: QuizPayload = payload(activity_type, value)?;
                Ok(Self::QuizPassed {
                    difficulty: p.difficulty,
                })
            }
            "evaluation_submitted" => {
                let p: EvaluationPayload = payload(activity_type, value)?;
                if p.score > MAX_EVALUATION_SCORE {
                    return Err(KudosError::Validation(format!(
                        "evaluation score {} outside 0..={MAX_EVALUATION_SCORE}",
                        p.score
                    )));
                }
                Ok(Self::EvaluationSubmitted { score: p.score })
            }
            "guide_completed" => Ok(Self::GuideCompleted),
            "study_session" => {
                let p: StudyPayload = payload(activity_type, value)?;
                if p.minutes > MAX_STUDY_MINUTES {
                    return Err(KudosError::Validation(format!(
                        "study session of {} minutes exceeds one day",
                        p.minutes
                    )));
                }
                Ok(Self::StudySession { minutes: p.minutes })
            }
            other => Ok(Self::Unrecognized {
                activity_type: other.to_string(),
            }),
        }
    }

    /// Weekly-consistency category, if this activity counts towards one.
    pub fn category(&self) -> Option<ActivityCategory> {
        match self {
            Self::FlashcardReview { .. } => Some(ActivityCategory::Flashcards),
            Self::QuizPassed { .. } => Some(ActivityCategory::Quiz),
            Self::EvaluationSubmitted { .. } => Some(ActivityCategory::Evaluation),
            Self::GuideCompleted => Some(ActivityCategory::Guide),
            Self::StudySession { .. } | Self::Unrecognized { .. } => None,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized { .. })
    }
}

//! Quest activation, deactivation and expiry.
//!
//! `Inactive → Active → Completed`, with `Deactivated` reachable from
//! `Active` either explicitly or when the daily job finds it past `expires_on`.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use kudos_core::config::{QuestConfig, QuestRequirements, StreakConfig};
use kudos_core::{
    Clock, KudosError, KudosResult, QuestActivation, QuestProgress, QuestStatus, UserAggregate,
    Week7Quest,
};
use tracing::info;

use super::evaluator;
use crate::transaction::{Mutation, OptimisticWriter};

/// Deactivate an active quest whose last day is before `today`.
pub fn expire_if_due(quest: &mut Week7Quest, today: NaiveDate) -> bool {
    match quest.expires_on {
        Some(expires_on) if quest.active() && expires_on < today => {
            quest.status = QuestStatus::Deactivated;
            true
        }
        _ => false,
    }
}

/// Activation rules applied to a loaded aggregate. Pure so it can be retried.
pub fn try_activate(
    aggregate: &mut UserAggregate,
    course_id: &str,
    today: NaiveDate,
    config: &QuestConfig,
) -> QuestActivation {
    expire_if_due(&mut aggregate.week7_quest, today);

    let quest = &aggregate.week7_quest;
    if quest.active() {
        return QuestActivation::rejected("a readiness quest is already active");
    }
    if quest.status == QuestStatus::Completed && quest.course_id.as_deref() == Some(course_id) {
        return QuestActivation::rejected("the readiness quest for this course is already completed");
    }
    if let Some(enrolled) = aggregate.course_id.as_deref() {
        if enrolled != course_id {
            return QuestActivation::rejected(format!(
                "user is enrolled in `{enrolled}`, not `{course_id}`"
            ));
        }
    }

    let duration = i64::from(config.duration_days.max(1));
    aggregate.course_id = Some(course_id.to_string());
    aggregate.week7_quest = Week7Quest {
        status: QuestStatus::Active,
        course_id: Some(course_id.to_string()),
        exam_readiness_percent: 0,
        boss_battle_completed: false,
        double_xp_earned: 0,
        activated_on: Some(today),
        expires_on: Some(today + Duration::days(duration - 1)),
    };
    evaluator::refresh(
        &mut aggregate.week7_quest,
        &aggregate.activities,
        &config.requirements,
    );

    QuestActivation::Activated {
        quest: aggregate.week7_quest.clone(),
    }
}

pub struct QuestService {
    writer: OptimisticWriter,
    config: QuestConfig,
    streak: StreakConfig,
    clock: Arc<dyn Clock>,
}

impl QuestService {
    pub fn new(
        writer: OptimisticWriter,
        config: QuestConfig,
        streak: StreakConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            writer,
            config,
            streak,
            clock,
        }
    }

    pub fn requirements(&self) -> QuestRequirements {
        self.config.requirements.clone()
    }

    pub async fn activate(
        &self,
        user_id: &str,
        course_id: &str,
        current_week: u32,
    ) -> KudosResult<QuestActivation> {
        if user_id.trim().is_empty() || course_id.trim().is_empty() {
            return Err(KudosError::Validation(
                "user_id and course_id must be non-empty".into(),
            ));
        }
        if current_week != self.config.quest_week {
            return Ok(QuestActivation::rejected(format!(
                "the readiness quest opens in week {}, not week {current_week}",
                self.config.quest_week
            )));
        }

        let now = self.clock.now();
        let today = self.streak.local_date(now);
        let committed = self
            .writer
            .modify(user_id, true, |agg| {
                let result = try_activate(agg, course_id, today, &self.config);
                if result.is_activated() {
                    agg.updated_at = now;
                    Ok(Mutation::Write(result))
                } else {
                    Ok(Mutation::Skip(result))
                }
            })
            .await?;

        let activation = committed
            .map(|c| c.value)
            .unwrap_or_else(|| QuestActivation::rejected("user not found"));
        if let QuestActivation::Activated { quest } = &activation {
            info!(
                user_id,
                course_id,
                expires_on = ?quest.expires_on,
                readiness = quest.exam_readiness_percent,
                "readiness quest activated"
            );
        }
        Ok(activation)
    }

    /// Returns whether an active quest was deactivated.
    pub async fn deactivate(&self, user_id: &str) -> KudosResult<bool> {
        let now = self.clock.now();
        let committed = self
            .writer
            .modify(user_id, false, |agg| {
                if agg.week7_quest.active() {
                    agg.week7_quest.status = QuestStatus::Deactivated;
                    agg.updated_at = now;
                    Ok(Mutation::Write(true))
                } else {
                    Ok(Mutation::Skip(false))
                }
            })
            .await?;

        let deactivated = committed.is_some_and(|c| c.value);
        if deactivated {
            info!(user_id, "readiness quest deactivated");
        }
        Ok(deactivated)
    }

    pub async fn progress(&self, user_id: &str) -> KudosResult<QuestProgress> {
        let aggregate = match self.writer.load(user_id).await? {
            Some(v) => v.aggregate,
            None => UserAggregate::new(user_id, self.clock.now()),
        };
        Ok(evaluator::progress(
            &aggregate.week7_quest,
            &aggregate.activities,
            &self.config.requirements,
        ))
    }
}

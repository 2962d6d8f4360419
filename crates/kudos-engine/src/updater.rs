//! ProgressUpdater: applies one activity event to a user's aggregate.
//!
//! ```text
//! Received → Loaded → Computed → Committed → BadgeChecked → Done
//!               ↑                   │
//!               └────── Retry ──────┘  (version conflict, bounded)
//! ```
//!
//! XP, counters, streak, weekly progress and quest fields for the event land in
//! one optimistic commit. Badge evaluation runs afterwards and can only degrade
//! the result, never undo the commit.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use kudos_core::config::KudosConfig;
use kudos_core::{
    Activity, ActivityEvent, ActivityOutcome, Clock, KudosError, KudosResult, RecoveryAction,
    UserAggregate,
};
use tracing::{error, trace, warn};

use crate::badges::BadgeEngine;
use crate::quest::{evaluator, lifecycle};
use crate::streak;
use crate::transaction::{Mutation, OptimisticWriter};
use crate::xp::{level_for, stack, BonusBreakdown, XpCalculator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateState {
    Received,
    Loaded,
    Computed,
    Committed,
    BadgeChecked,
    Done,
    Failed,
}

impl fmt::Display for UpdateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Received => "received",
            Self::Loaded => "loaded",
            Self::Computed => "computed",
            Self::Committed => "committed",
            Self::BadgeChecked => "badge_checked",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

fn transition(user_id: &str, state: UpdateState) {
    trace!(user_id, state = %state, "progress update");
}

/// In-memory effect of one event on one aggregate.
#[derive(Debug, Clone, Copy)]
pub struct EventEffect {
    pub bonus: BonusBreakdown,
    pub leveled_up: bool,
}

/// Apply `activity` to `aggregate`. Pure: safe to re-run after a conflict.
pub fn compute(
    aggregate: &mut UserAggregate,
    activity: &Activity,
    event_course: Option<&str>,
    base_xp: u64,
    occurred_at: DateTime<Utc>,
    now: DateTime<Utc>,
    config: &KudosConfig,
) -> EventEffect {
    let today = config.streak.local_date(occurred_at);

    if aggregate.course_id.is_none() {
        aggregate.course_id = event_course.map(str::to_string);
    }

    // Stale weekly bonus and expired quests are settled before stacking, in
    // case the daily job has not run yet.
    streak::roll_week(&mut aggregate.weekly, &mut aggregate.streak, today);
    lifecycle::expire_if_due(&mut aggregate.week7_quest, today);

    // Only the event's own course counts; the aggregate's course is not a fallback.
    let quest_applies = activity.is_recognized() && aggregate.week7_quest.applies_to(event_course);

    let bonus = stack(
        base_xp,
        aggregate.streak.bonus_active,
        aggregate.streak.bonus_multiplier,
        quest_applies,
    );

    let level_before = aggregate.level;
    aggregate.total_xp = aggregate.total_xp.saturating_add(bonus.xp_awarded);
    let level = level_for(aggregate.total_xp);
    aggregate.level = level.level;
    aggregate.xp_to_next_level = level.xp_to_next_level;

    aggregate.activities.apply(activity);
    streak::record_activity(&mut aggregate.streak, today, &config.streak);
    if let Some(category) = activity.category() {
        streak::record_category(
            &mut aggregate.weekly,
            &mut aggregate.streak,
            category,
            today,
            config.xp.weekly_bonus_multiplier,
        );
    }

    if quest_applies {
        evaluator::apply_event(
            &mut aggregate.week7_quest,
            &aggregate.activities,
            bonus.week7_bonus,
            &config.quest.requirements,
        );
    }

    aggregate.updated_at = now;
    EventEffect {
        bonus,
        leveled_up: aggregate.level > level_before,
    }
}

pub struct ProgressUpdater {
    writer: OptimisticWriter,
    badges: Arc<BadgeEngine>,
    calculator: XpCalculator,
    config: Arc<KudosConfig>,
    clock: Arc<dyn Clock>,
}

impl ProgressUpdater {
    pub fn new(
        writer: OptimisticWriter,
        badges: Arc<BadgeEngine>,
        config: Arc<KudosConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            writer,
            badges,
            calculator: XpCalculator::new(config.xp.max_xp_per_activity),
            config,
            clock,
        }
    }

    pub async fn apply(&self, event: ActivityEvent) -> KudosResult<ActivityOutcome> {
        let user_id = event.user_id.as_str();
        transition(user_id, UpdateState::Received);

        if user_id.trim().is_empty() {
            return Err(KudosError::Validation("user_id must be non-empty".into()));
        }
        let (activity, base_xp) =
            self.calculator
                .evaluate(user_id, &event.activity_type, &event.payload)?;

        let now = self.clock.now();
        let result = self
            .writer
            .modify(user_id, true, |agg| {
                transition(user_id, UpdateState::Loaded);
                if !activity.is_recognized() {
                    return Ok(Mutation::Skip(EventEffect {
                        bonus: stack(0, false, 1.0, false),
                        leveled_up: false,
                    }));
                }
                let computed = compute(
                    agg,
                    &activity,
                    event.course_id.as_deref(),
                    base_xp,
                    event.occurred_at,
                    now,
                    &self.config,
                );
                transition(user_id, UpdateState::Computed);
                Ok(Mutation::Write(computed))
            })
            .await;

        let committed = match result {
            Ok(Some(c)) => c,
            Ok(None) => {
                return Err(KudosError::StoreUnavailable {
                    reason: "aggregate vanished during update".into(),
                })
            }
            Err(e) => {
                transition(user_id, UpdateState::Failed);
                warn!(user_id, error = %e, "activity update failed");
                return Err(e);
            }
        };
        if committed.written {
            transition(user_id, UpdateState::Committed);
        }

        let (badges_unlocked, badge_check_degraded) = if committed.written {
            match self.badges.evaluate_and_unlock(&committed.aggregate).await {
                Ok(unlocked) => (unlocked, false),
                Err(e) => {
                    // The commit stands whatever the action; only the log level differs.
                    match RecoveryAction::for_error(&e) {
                        RecoveryAction::Fallback => {
                            warn!(user_id, error = %e, "badge check degraded after commit, no badges this cycle");
                        }
                        action => {
                            error!(user_id, error = %e, %action, "unexpected badge failure after commit");
                        }
                    }
                    (Vec::new(), true)
                }
            }
        } else {
            (Vec::new(), false)
        };
        transition(user_id, UpdateState::BadgeChecked);

        let aggregate = committed.aggregate;
        let effect = committed.value;
        transition(user_id, UpdateState::Done);

        Ok(ActivityOutcome {
            user_id: aggregate.user_id.clone(),
            xp_awarded: effect.bonus.xp_awarded,
            base_xp: effect.bonus.base_xp,
            consistency_bonus: effect.bonus.consistency_bonus,
            week7_bonus: effect.bonus.week7_bonus,
            total_xp: aggregate.total_xp,
            level: aggregate.level,
            leveled_up: effect.leveled_up,
            streak: aggregate.streak,
            quest: aggregate.week7_quest,
            badges_unlocked,
            badge_check_degraded,
        })
    }
}

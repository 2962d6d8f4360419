//! Criteria evaluation against an aggregate.

use kudos_core::models::{ActivityThresholds, CriterionProgress};
use kudos_core::{ActivityCounters, BadgeCriteria, UserAggregate};

fn counter(counters: &ActivityCounters, key: &str) -> u64 {
    match key {
        "flashcards_reviewed" => counters.flashcards_reviewed,
        "flashcard_sets" => counters.flashcard_sets,
        "quizzes_passed" => counters.quizzes_passed,
        "evaluations_submitted" => counters.evaluations_submitted,
        "guides_completed" => counters.guides_completed,
        "study_time_minutes" => counters.study_time_minutes,
        _ => 0,
    }
}

fn thresholds_met(t: &ActivityThresholds, counters: &ActivityCounters) -> bool {
    let entries = t.entries();
    !entries.is_empty()
        && entries
            .iter()
            .all(|(key, required)| counter(counters, key) >= *required)
}

pub fn is_satisfied(criteria: &BadgeCriteria, aggregate: &UserAggregate) -> bool {
    match criteria {
        BadgeCriteria::TotalXp { min_xp } => aggregate.total_xp >= *min_xp,
        BadgeCriteria::StreakDays { min_days } => aggregate.streak.longest_count >= *min_days,
        BadgeCriteria::ActivityThresholds(t) => thresholds_met(t, &aggregate.activities),
        BadgeCriteria::JoinedBefore { cutoff } => aggregate.created_at <= *cutoff,
        BadgeCriteria::QuestCompleted => aggregate.week7_quest.boss_battle_completed,
    }
}

/// `None` when `required` is zero: there is nothing to measure against.
fn component(key: &str, current: u64, required: u64) -> Option<CriterionProgress> {
    if required == 0 {
        return None;
    }
    let percent = (current.saturating_mul(100) / required).min(100) as u8;
    Some(CriterionProgress {
        key: key.to_string(),
        current,
        required,
        percent,
    })
}

/// Progress components and their floored mean, or `None` for criteria that
/// have no numeric progress.
pub fn progress(criteria: &BadgeCriteria, aggregate: &UserAggregate) -> Option<(u8, Vec<CriterionProgress>)> {
    let components: Vec<CriterionProgress> = match criteria {
        BadgeCriteria::TotalXp { min_xp } => {
            component("total_xp", aggregate.total_xp, *min_xp).into_iter().collect()
        }
        BadgeCriteria::StreakDays { min_days } => component(
            "streak_days",
            u64::from(aggregate.streak.longest_count),
            u64::from(*min_days),
        )
        .into_iter()
        .collect(),
        BadgeCriteria::ActivityThresholds(t) => t
            .entries()
            .into_iter()
            .filter_map(|(key, required)| {
                component(key, counter(&aggregate.activities, key), required)
            })
            .collect(),
        BadgeCriteria::QuestCompleted => component(
            "exam_readiness_percent",
            u64::from(aggregate.week7_quest.exam_readiness_percent),
            100,
        )
        .into_iter()
        .collect(),
        BadgeCriteria::JoinedBefore { .. } => Vec::new(),
    };

    if components.is_empty() {
        return None;
    }
    let sum: u64 = components.iter().map(|c| u64::from(c.percent)).sum();
    let mean = (sum / components.len() as u64) as u8;
    Some((mean, components))
}

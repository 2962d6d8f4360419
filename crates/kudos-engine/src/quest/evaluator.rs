//! Readiness scoring and per-event quest updates.

use kudos_core::config::QuestRequirements;
use kudos_core::{ActivityCounters, QuestProgress, QuestStatus, Week7Quest};

/// Per-category percentages and their floored mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Readiness {
    pub flashcards: u8,
    pub quizzes: u8,
    pub evaluations: u8,
    pub guides: u8,
    pub overall: u8,
}

/// `current / required` as a percentage in `[0, 100]`. A zero requirement
/// counts as already met.
pub fn category_percent(current: u64, required: u64) -> u8 {
    if required == 0 {
        return 100;
    }
    let pct = current.saturating_mul(100) / required;
    pct.min(100) as u8
}

pub fn compute_readiness(counters: &ActivityCounters, req: &QuestRequirements) -> Readiness {
    let flashcards = category_percent(counters.flashcards_reviewed, req.flashcards);
    let quizzes = category_percent(counters.quizzes_passed, req.quizzes);
    let evaluations = category_percent(counters.evaluations_submitted, req.evaluations);
    let guides = category_percent(counters.guides_completed, req.guides);
    let sum = u32::from(flashcards) + u32::from(quizzes) + u32::from(evaluations) + u32::from(guides);
    Readiness {
        flashcards,
        quizzes,
        evaluations,
        guides,
        overall: (sum / 4) as u8,
    }
}

/// Refresh readiness and complete the boss battle at 100%. One-way: a
/// completed quest is never reopened.
pub fn refresh(quest: &mut Week7Quest, counters: &ActivityCounters, req: &QuestRequirements) -> bool {
    if !quest.active() {
        return false;
    }
    quest.exam_readiness_percent = compute_readiness(counters, req).overall;
    if quest.exam_readiness_percent >= 100 && !quest.boss_battle_completed {
        quest.boss_battle_completed = true;
        quest.status = QuestStatus::Completed;
        return true;
    }
    false
}

/// Apply one matching activity to an active quest. Returns true if the
/// boss battle was completed by this event.
pub fn apply_event(
    quest: &mut Week7Quest,
    counters: &ActivityCounters,
    week7_bonus: u64,
    req: &QuestRequirements,
) -> bool {
    if !quest.active() {
        return false;
    }
    quest.double_xp_earned = quest.double_xp_earned.saturating_add(week7_bonus);
    refresh(quest, counters, req)
}

pub fn progress(quest: &Week7Quest, counters: &ActivityCounters, req: &QuestRequirements) -> QuestProgress {
    let r = compute_readiness(counters, req);
    QuestProgress {
        quest: quest.clone(),
        flashcards_percent: r.flashcards,
        quizzes_percent: r.quizzes,
        evaluations_percent: r.evaluations,
        guides_percent: r.guides,
        readiness_percent: r.overall,
        requirements: req.clone(),
    }
}

//! Default badge catalog seeded by operators on first deploy.

use kudos_core::models::ActivityThresholds;
use kudos_core::{BadgeCategory, BadgeCriteria, BadgeDefinition};

fn thresholds(t: ActivityThresholds) -> BadgeCriteria {
    BadgeCriteria::ActivityThresholds(t)
}

pub fn default_catalog() -> Vec<BadgeDefinition> {
    use BadgeCategory::*;
    vec![
        BadgeDefinition::new(
            "streak_3",
            "Warming Up",
            "Study three days in a row",
            Streak,
            BadgeCriteria::StreakDays { min_days: 3 },
        ),
        BadgeDefinition::new(
            "streak_7",
            "Week Warrior",
            "Keep a seven-day streak",
            Streak,
            BadgeCriteria::StreakDays { min_days: 7 },
        ),
        BadgeDefinition::new(
            "streak_30",
            "Unbreakable",
            "Keep a thirty-day streak",
            Streak,
            BadgeCriteria::StreakDays { min_days: 30 },
        ),
        BadgeDefinition::new(
            "xp_100",
            "First Hundred",
            "Earn 100 XP",
            Xp,
            BadgeCriteria::TotalXp { min_xp: 100 },
        ),
        BadgeDefinition::new(
            "xp_1000",
            "Thousand Club",
            "Earn 1,000 XP",
            Xp,
            BadgeCriteria::TotalXp { min_xp: 1_000 },
        ),
        BadgeDefinition::new(
            "xp_10000",
            "Scholar's Hoard",
            "Earn 10,000 XP",
            Xp,
            BadgeCriteria::TotalXp { min_xp: 10_000 },
        ),
        BadgeDefinition::new(
            "flashcard_sets_10",
            "Card Shark",
            "Finish ten flashcard review sessions",
            Activity,
            thresholds(ActivityThresholds {
                flashcard_sets: Some(10),
                ..Default::default()
            }),
        ),
        BadgeDefinition::new(
            "quizzes_5",
            "Quiz Whiz",
            "Pass five quizzes",
            Activity,
            thresholds(ActivityThresholds {
                quizzes_passed: Some(5),
                ..Default::default()
            }),
        ),
        BadgeDefinition::new(
            "evaluations_3",
            "Under Review",
            "Submit three evaluations",
            Activity,
            thresholds(ActivityThresholds {
                evaluations_submitted: Some(3),
                ..Default::default()
            }),
        ),
        BadgeDefinition::new(
            "well_rounded",
            "Well Rounded",
            "Review 100 cards, pass 3 quizzes and complete 2 guides",
            Activity,
            thresholds(ActivityThresholds {
                flashcards_reviewed: Some(100),
                quizzes_passed: Some(3),
                guides_completed: Some(2),
                ..Default::default()
            }),
        ),
        BadgeDefinition::new(
            "study_600",
            "Ten Hours In",
            "Log 600 minutes of study time",
            Activity,
            thresholds(ActivityThresholds {
                study_time_minutes: Some(600),
                ..Default::default()
            }),
        ),
        BadgeDefinition::new(
            "exam_ready",
            "Boss Slayer",
            "Complete the week-7 readiness quest",
            Special,
            BadgeCriteria::QuestCompleted,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn twelve_unique_active_badges_across_all_categories() {
        let catalog = default_catalog();
        assert_eq!(catalog.len(), 12);

        let ids: HashSet<_> = catalog.iter().map(|b| b.badge_id.as_str()).collect();
        assert_eq!(ids.len(), 12);
        assert!(catalog.iter().all(|b| b.active));

        let categories: HashSet<_> = catalog.iter().map(|b| b.category).collect();
        assert_eq!(categories.len(), 4);
    }
}

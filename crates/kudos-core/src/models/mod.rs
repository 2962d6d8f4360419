mod activity;
mod aggregate;
mod badge;
mod maintenance_report;
mod outcome;
mod quest;

pub use activity::{Activity, ActivityCategory, ActivityEvent, QuizDifficulty};
pub use aggregate::{ActivityCounters, StreakState, UserAggregate, WeeklyProgress};
pub use badge::{
    ActivityThresholds, BadgeCategory, BadgeCriteria, BadgeDefinition, BadgeProgress,
    CriterionProgress, UserBadge,
};
pub use maintenance_report::{MaintenanceOutcome, MaintenanceReport};
pub use outcome::{ActivityOutcome, LevelInfo, UserStats};
pub use quest::{QuestActivation, QuestProgress, QuestStatus, Week7Quest};

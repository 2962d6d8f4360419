//! # kudos-core
//!
//! Foundation crate for the Kudos gamification engine.
//! Defines the per-user aggregate model, badge and activity types, errors,
//! configuration, the storage trait, the clock abstraction and tracing setup.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod errors;
pub mod models;
pub mod observability;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::KudosConfig;
pub use errors::{KudosError, KudosResult, RecoveryAction, StorageError, StorageResult};
pub use models::{
    Activity, ActivityCategory, ActivityCounters, ActivityEvent, ActivityOutcome, BadgeCategory,
    BadgeCriteria, BadgeDefinition, BadgeProgress, LevelInfo, MaintenanceOutcome,
    MaintenanceReport, QuestActivation, QuestProgress, QuestStatus, StreakState, UserAggregate,
    UserBadge, UserStats, Week7Quest, WeeklyProgress,
};
pub use traits::{Clock, IAggregateStore, ManualClock, SystemClock, VersionedAggregate};

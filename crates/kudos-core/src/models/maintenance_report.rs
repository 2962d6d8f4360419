use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summary of one daily maintenance run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub users_scanned: u64,
    pub users_updated: u64,
    pub streaks_broken: u64,
    pub freezes_consumed: u64,
    pub weekly_resets: u64,
    pub quests_expired: u64,
    pub failures: u64,
}

impl MaintenanceReport {
    pub fn new(run_id: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id: run_id.into(),
            started_at,
            finished_at: started_at,
            users_scanned: 0,
            users_updated: 0,
            streaks_broken: 0,
            freezes_consumed: 0,
            weekly_resets: 0,
            quests_expired: 0,
            failures: 0,
        }
    }
}

/// Result of triggering the job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MaintenanceOutcome {
    Completed(MaintenanceReport),
    /// Another run was already executing.
    Skipped,
}

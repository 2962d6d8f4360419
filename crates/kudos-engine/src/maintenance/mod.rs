//! Daily streak maintenance: the batch job and its scheduler.

pub mod job;
pub mod scheduler;

pub use job::{maintain_user, MaintenanceJob, UserTally};
pub use scheduler::{next_run_after, SchedulerHandle};

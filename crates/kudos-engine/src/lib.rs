//! # kudos-engine
//!
//! XP, streak, badge and quest logic over a versioned per-user aggregate.
//!
//! ## Modules
//! - `badges`: criteria evaluation, default catalog, idempotent unlock, degraded mode
//! - `gateway`: blocking store calls on the blocking pool under a timeout
//! - `health`: per-subsystem checks and the combined status
//! - `maintenance`: daily streak job and its scheduler
//! - `quest`: week-7 readiness quest: activation, expiry, readiness scoring
//! - `runtime`: `GamificationEngine`, the public facade
//! - `streak`: daily streak, freezes and the weekly consistency bonus
//! - `transaction`: optimistic read-modify-write with bounded retry
//! - `updater`: applies one activity event in a single commit
//! - `xp`: base XP table, bonus stacking, level tiers

pub mod badges;
pub mod gateway;
pub mod health;
pub mod maintenance;
pub mod quest;
pub mod runtime;
pub mod streak;
pub mod transaction;
pub mod updater;
pub mod xp;

pub use health::{HealthReport, HealthStatus, SubsystemCheck};
pub use maintenance::{MaintenanceJob, SchedulerHandle};
pub use runtime::{GamificationEngine, Role};
pub use updater::ProgressUpdater;

//! Daily streak maintenance over every stored user.
//!
//! Users are paged by id and processed concurrently inside each page, each in
//! its own optimistic transaction. One user's failure is counted and logged;
//! it never stops the run. Two runs never overlap: a trigger that arrives while
//! a run is in progress returns `Skipped`.
//!
//! A badge engine left degraded by a startup outage gets one catalog reload
//! per run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use kudos_core::config::KudosConfig;
use kudos_core::{Clock, KudosError, KudosResult, MaintenanceOutcome, MaintenanceReport};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::badges::BadgeEngine;
use crate::quest::lifecycle;
use crate::streak::{self, DailyStreakOutcome};
use crate::transaction::{Mutation, OptimisticWriter};

/// What the daily pass changed for one user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserTally {
    pub streak_broken: bool,
    pub freeze_consumed: bool,
    pub weekly_reset: bool,
    pub quest_expired: bool,
}

impl UserTally {
    pub fn changed(&self) -> bool {
        self.streak_broken || self.freeze_consumed || self.weekly_reset || self.quest_expired
    }

    fn add_to(&self, report: &mut MaintenanceReport) {
        if self.changed() {
            report.users_updated += 1;
        }
        report.streaks_broken += u64::from(self.streak_broken);
        report.freezes_consumed += u64::from(self.freeze_consumed);
        report.weekly_resets += u64::from(self.weekly_reset);
        report.quests_expired += u64::from(self.quest_expired);
    }
}

/// Apply the daily rules to one user's aggregate.
pub async fn maintain_user(
    writer: &OptimisticWriter,
    user_id: &str,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> KudosResult<UserTally> {
    let committed = writer
        .modify(user_id, false, |agg| {
            let mut tally = UserTally::default();
            match streak::apply_daily(&mut agg.streak, today) {
                DailyStreakOutcome::Broken => tally.streak_broken = true,
                DailyStreakOutcome::FreezeConsumed => tally.freeze_consumed = true,
                DailyStreakOutcome::Unchanged => {}
            }
            tally.weekly_reset = streak::roll_week(&mut agg.weekly, &mut agg.streak, today);
            tally.quest_expired = lifecycle::expire_if_due(&mut agg.week7_quest, today);

            if tally.changed() {
                agg.updated_at = now;
                Ok(Mutation::Write(tally))
            } else {
                Ok(Mutation::Skip(tally))
            }
        })
        .await?;
    Ok(committed.map(|c| c.value).unwrap_or_default())
}

/// Resets the running flag even if the run future is dropped.
struct RunGuard(Arc<AtomicBool>);

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct MaintenanceJob {
    writer: OptimisticWriter,
    badges: Arc<BadgeEngine>,
    config: Arc<KudosConfig>,
    clock: Arc<dyn Clock>,
    running: Arc<AtomicBool>,
}

impl MaintenanceJob {
    pub fn new(
        writer: OptimisticWriter,
        badges: Arc<BadgeEngine>,
        config: Arc<KudosConfig>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            writer,
            badges,
            config,
            clock,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run one full pass. Only errors that prevent scanning users at all are
    /// returned; per-user failures are reported in `MaintenanceReport::failures`.
    pub async fn run(&self) -> KudosResult<MaintenanceOutcome> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            info!("maintenance already running, skipping this trigger");
            return Ok(MaintenanceOutcome::Skipped);
        }
        let _guard = RunGuard(Arc::clone(&self.running));

        let started_at = self.clock.now();
        let today = self.config.streak.local_date(started_at);
        let mut report = MaintenanceReport::new(Uuid::new_v4().to_string(), started_at);
        info!(run_id = %report.run_id, %today, "maintenance run started");

        if self.badges.is_degraded().await {
            if self.badges.refresh().await {
                info!(run_id = %report.run_id, "badge catalog recovered by maintenance");
            } else {
                warn!(run_id = %report.run_id, "badge catalog still unavailable");
            }
        }

        let batch_size = self.config.maintenance.batch_size.max(1);
        let semaphore = Arc::new(Semaphore::new(self.config.maintenance.workers.max(1)));
        let mut cursor: Option<String> = None;

        loop {
            let after = cursor.clone();
            let page = self
                .writer
                .gateway()
                .call("list_user_ids_after", move |store| {
                    store.list_user_ids_after(after.as_deref(), batch_size)
                })
                .await
                .inspect_err(|e| warn!(run_id = %report.run_id, error = %e, "maintenance aborted, cannot list users"))?;

            if page.is_empty() {
                break;
            }
            report.users_scanned += page.len() as u64;
            cursor = page.last().cloned();
            let full_page = page.len() == batch_size;

            self.process_page(page, today, &semaphore, &mut report).await?;
            debug!(run_id = %report.run_id, scanned = report.users_scanned, "maintenance page done");

            if !full_page {
                break;
            }
        }

        report.finished_at = self.clock.now();
        let to_store = report.clone();
        if let Err(e) = self
            .writer
            .gateway()
            .call("record_maintenance_run", move |store| {
                store.record_maintenance_run(&to_store)
            })
            .await
        {
            warn!(run_id = %report.run_id, error = %e, "could not persist maintenance report");
        }

        info!(
            run_id = %report.run_id,
            users_scanned = report.users_scanned,
            users_updated = report.users_updated,
            streaks_broken = report.streaks_broken,
            freezes_consumed = report.freezes_consumed,
            weekly_resets = report.weekly_resets,
            quests_expired = report.quests_expired,
            failures = report.failures,
            "maintenance run finished"
        );
        Ok(MaintenanceOutcome::Completed(report))
    }

    async fn process_page(
        &self,
        page: Vec<String>,
        today: NaiveDate,
        semaphore: &Arc<Semaphore>,
        report: &mut MaintenanceReport,
    ) -> KudosResult<()> {
        let now = self.clock.now();
        let mut tasks = JoinSet::new();

        for user_id in page {
            let permit = Arc::clone(semaphore)
                .acquire_owned()
                .await
                .map_err(|_| KudosError::StoreUnavailable {
                    reason: "maintenance worker pool closed".into(),
                })?;
            let writer = self.writer.clone();
            tasks.spawn(async move {
                let _permit = permit;
                let result = maintain_user(&writer, &user_id, today, now).await;
                (user_id, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(tally))) => tally.add_to(report),
                Ok((user_id, Err(e))) => {
                    report.failures += 1;
                    warn!(run_id = %report.run_id, user_id = %user_id, error = %e, "maintenance failed for user");
                }
                Err(e) => {
                    report.failures += 1;
                    warn!(run_id = %report.run_id, error = %e, "maintenance task panicked");
                }
            }
        }
        Ok(())
    }
}

//! Daily trigger for the maintenance job.

use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, TimeZone, Utc};
use kudos_core::{Clock, KudosResult, MaintenanceOutcome};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::job::MaintenanceJob;

/// First instant strictly after `now` whose local wall-clock time is `run_at`.
pub fn next_run_after(now: DateTime<Utc>, run_at: NaiveTime, offset: FixedOffset) -> DateTime<Utc> {
    let local = now.with_timezone(&offset);
    let mut candidate = local.date_naive().and_time(run_at);
    if candidate <= local.naive_local() {
        candidate += Duration::days(1);
    }
    let utc = candidate - Duration::seconds(i64::from(offset.local_minus_utc()));
    Utc.from_utc_datetime(&utc)
}

/// Handle to a running scheduler loop.
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop the loop and wait for it to exit. A run already in progress is
    /// allowed to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            error!(error = %e, "maintenance scheduler task failed");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawn the daily loop on the current runtime.
pub fn spawn(
    job: Arc<MaintenanceJob>,
    run_at: NaiveTime,
    offset: FixedOffset,
    clock: Arc<dyn Clock>,
) -> SchedulerHandle {
    let (shutdown, mut shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut last_fire: Option<DateTime<Utc>> = None;
        loop {
            let now = clock.now();
            let from = last_fire.map_or(now, |fired| fired.max(now));
            let next = next_run_after(from, run_at, offset);
            let wait = (next - now).to_std().unwrap_or_default();
            info!(next_run = %next, "maintenance scheduled");

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    last_fire = Some(next);
                    log_run(job.run().await);
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("maintenance scheduler stopped");
                        break;
                    }
                }
            }
        }
    });

    SchedulerHandle { shutdown, task }
}

fn log_run(result: KudosResult<MaintenanceOutcome>) {
    match result {
        Ok(MaintenanceOutcome::Completed(_)) => {}
        Ok(MaintenanceOutcome::Skipped) => info!("scheduled maintenance skipped, previous run still active"),
        Err(e) => error!(error = %e, "scheduled maintenance run failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn later_today_when_not_yet_passed() {
        let utc0 = FixedOffset::east_opt(0).unwrap();
        assert_eq!(
            next_run_after(utc(2026, 3, 2, 0, 1), at(0, 5), utc0),
            utc(2026, 3, 2, 0, 5)
        );
    }

    #[test]
    fn tomorrow_when_passed_or_equal() {
        let utc0 = FixedOffset::east_opt(0).unwrap();
        assert_eq!(
            next_run_after(utc(2026, 3, 2, 0, 5), at(0, 5), utc0),
            utc(2026, 3, 3, 0, 5)
        );
        assert_eq!(
            next_run_after(utc(2026, 3, 2, 18, 0), at(0, 5), utc0),
            utc(2026, 3, 3, 0, 5)
        );
    }

    #[test]
    fn honours_local_offset() {
        // UTC-8: 00:05 local is 08:05 UTC.
        let pst = FixedOffset::west_opt(8 * 3600).unwrap();
        assert_eq!(
            next_run_after(utc(2026, 3, 2, 7, 0), at(0, 5), pst),
            utc(2026, 3, 2, 8, 5)
        );
        // 09:00 UTC is 01:00 local, already past today's run.
        assert_eq!(
            next_run_after(utc(2026, 3, 2, 9, 0), at(0, 5), pst),
            utc(2026, 3, 3, 8, 5)
        );
    }
}

//! Maintenance run history.

use kudos_core::{MaintenanceReport, StorageResult};
use rusqlite::{params, Connection, OptionalExtension};

use super::{parse_ts, ts};
use crate::to_storage_err;

pub fn record_maintenance_run(conn: &Connection, report: &MaintenanceReport) -> StorageResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO maintenance_runs
            (run_id, started_at, finished_at, users_scanned, users_updated,
             streaks_broken, freezes_consumed, weekly_resets, quests_expired, failures)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            report.run_id,
            ts(&report.started_at),
            ts(&report.finished_at),
            report.users_scanned as i64,
            report.users_updated as i64,
            report.streaks_broken as i64,
            report.freezes_consumed as i64,
            report.weekly_resets as i64,
            report.quests_expired as i64,
            report.failures as i64,
        ],
    )
    .map_err(to_storage_err)?;
    Ok(())
}

type RunRow = (String, String, String, [i64; 7]);

pub fn last_maintenance_run(conn: &Connection) -> StorageResult<Option<MaintenanceReport>> {
    let row: Option<RunRow> = conn
        .query_row(
            "SELECT run_id, started_at, finished_at, users_scanned, users_updated,
                    streaks_broken, freezes_consumed, weekly_resets, quests_expired, failures
             FROM maintenance_runs
             ORDER BY started_at DESC
             LIMIT 1",
            [],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    [
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                        row.get(6)?,
                        row.get(7)?,
                        row.get(8)?,
                        row.get(9)?,
                    ],
                ))
            },
        )
        .optional()
        .map_err(to_storage_err)?;

    let Some((run_id, started_at, finished_at, counts)) = row else {
        return Ok(None);
    };
    let [scanned, updated, broken, freezes, resets, expired, failures] = counts.map(|n| n as u64);

    Ok(Some(MaintenanceReport {
        run_id,
        started_at: parse_ts("started_at", &started_at)?,
        finished_at: parse_ts("finished_at", &finished_at)?,
        users_scanned: scanned,
        users_updated: updated,
        streaks_broken: broken,
        freezes_consumed: freezes,
        weekly_resets: resets,
        quests_expired: expired,
        failures,
    }))
}

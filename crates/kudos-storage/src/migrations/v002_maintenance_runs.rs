//! v002: maintenance run history.

use kudos_core::StorageResult;
use rusqlite::Connection;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS maintenance_runs (
            run_id            TEXT PRIMARY KEY NOT NULL,
            started_at        TEXT NOT NULL,
            finished_at       TEXT NOT NULL,
            users_scanned     INTEGER NOT NULL,
            users_updated     INTEGER NOT NULL,
            streaks_broken    INTEGER NOT NULL,
            freezes_consumed  INTEGER NOT NULL,
            weekly_resets     INTEGER NOT NULL,
            quests_expired    INTEGER NOT NULL,
            failures          INTEGER NOT NULL
        ) STRICT;

        CREATE INDEX IF NOT EXISTS idx_maintenance_runs_started
            ON maintenance_runs(started_at);
        ",
    )
    .map_err(to_storage_err)
}

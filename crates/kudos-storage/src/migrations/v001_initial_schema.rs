//! v001: aggregates, badge definitions, earned badges.

use kudos_core::StorageResult;
use rusqlite::Connection;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS user_aggregates (
            user_id     TEXT PRIMARY KEY NOT NULL,
            version     INTEGER NOT NULL CHECK (version > 0),
            document    TEXT NOT NULL,
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        ) STRICT;

        CREATE TABLE IF NOT EXISTS badge_definitions (
            badge_id    TEXT PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            category    TEXT NOT NULL,
            criteria    TEXT NOT NULL,
            active      INTEGER NOT NULL DEFAULT 1,
            updated_at  TEXT NOT NULL
        ) STRICT;

        CREATE TABLE IF NOT EXISTS user_badges (
            user_id     TEXT NOT NULL,
            badge_id    TEXT NOT NULL,
            earned_at   TEXT NOT NULL,
            PRIMARY KEY (user_id, badge_id)
        ) STRICT;

        CREATE INDEX IF NOT EXISTS idx_badge_definitions_active
            ON badge_definitions(active);
        ",
    )
    .map_err(to_storage_err)
}

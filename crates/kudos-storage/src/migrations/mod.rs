//! Migration runner: version tracking, forward-only, transactional per migration.

mod v001_initial_schema;
mod v002_maintenance_runs;

use kudos_core::{StorageError, StorageResult};
use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::to_storage_err;

pub const LATEST_VERSION: u32 = 2;

type MigrationFn = fn(&Connection) -> StorageResult<()>;

const MIGRATIONS: [(u32, &str, MigrationFn); 2] = [
    (1, "initial_schema", v001_initial_schema::migrate),
    (2, "maintenance_runs", v002_maintenance_runs::migrate),
];

/// Current schema version, 0 if nothing has been applied.
pub fn current_version(conn: &Connection) -> StorageResult<u32> {
    let exists: bool = conn
        .prepare("SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version'")
        .and_then(|mut stmt| stmt.exists([]))
        .map_err(to_storage_err)?;

    if !exists {
        return Ok(0);
    }

    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .map_err(to_storage_err)
}

/// Apply pending migrations. Returns how many ran.
pub fn run_migrations(conn: &Connection) -> StorageResult<u32> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        ) STRICT;",
    )
    .map_err(to_storage_err)?;

    let current = current_version(conn)?;
    if current >= LATEST_VERSION {
        debug!("database schema is up to date (v{current})");
        return Ok(0);
    }

    info!("running migrations: v{current} → v{LATEST_VERSION}");
    let mut applied = 0;

    for &(version, name, migrate_fn) in &MIGRATIONS {
        if version <= current {
            continue;
        }

        conn.execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| StorageError::MigrationFailed {
                version,
                message: format!("begin: {e}"),
            })?;

        let result = migrate_fn(conn).and_then(|()| {
            conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])
                .map(|_| ())
                .map_err(to_storage_err)
        });

        match result {
            Ok(()) => {
                conn.execute_batch("COMMIT")
                    .map_err(|e| StorageError::MigrationFailed {
                        version,
                        message: format!("commit: {e}"),
                    })?;
                info!("applied migration v{version:03}: {name}");
                applied += 1;
            }
            Err(e) => {
                warn!("migration v{version:03} failed: {e}, rolling back");
                let _ = conn.execute_batch("ROLLBACK");
                return Err(StorageError::MigrationFailed {
                    version,
                    message: e.to_string(),
                });
            }
        }
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_db_migrates_to_latest() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(current_version(&conn).unwrap(), 0);

        let applied = run_migrations(&conn).unwrap();
        assert_eq!(applied, LATEST_VERSION);
        assert_eq!(current_version(&conn).unwrap(), LATEST_VERSION);
    }

    #[test]
    fn rerun_is_noop() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(run_migrations(&conn).unwrap(), 0);
    }
}

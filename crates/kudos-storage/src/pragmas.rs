//! SQLite PRAGMA configuration. Must run on every connection right after opening.

use kudos_core::StorageResult;
use rusqlite::Connection;

use crate::to_storage_err;

const BASE_PRAGMAS: &str = "
    PRAGMA journal_mode = WAL;
    PRAGMA synchronous = NORMAL;
    PRAGMA foreign_keys = ON;
    PRAGMA busy_timeout = 5000;
    PRAGMA cache_size = -8000;
    PRAGMA temp_store = MEMORY;
";

/// Writer setup: WAL for concurrent readers, busy_timeout for lock contention.
pub fn configure_connection(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(BASE_PRAGMAS).map_err(to_storage_err)
}

/// Reader setup: same as the writer plus `query_only`.
pub fn configure_readonly_connection(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(BASE_PRAGMAS).map_err(to_storage_err)?;
    conn.execute_batch("PRAGMA query_only = ON;")
        .map_err(to_storage_err)
}

//! Versioned aggregate documents: load, compare-and-swap commit, keyset scan.

use kudos_core::{StorageError, StorageResult, UserAggregate, VersionedAggregate};
use rusqlite::{params, Connection, OptionalExtension};

use super::ts;
use crate::to_storage_err;

pub fn get_aggregate(conn: &Connection, user_id: &str) -> StorageResult<Option<VersionedAggregate>> {
    let row: Option<(i64, String)> = conn
        .query_row(
            "SELECT version, document FROM user_aggregates WHERE user_id = ?1",
            params![user_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()
        .map_err(to_storage_err)?;

    let Some((version, document)) = row else {
        return Ok(None);
    };

    let aggregate: UserAggregate =
        serde_json::from_str(&document).map_err(|e| StorageError::Corrupt {
            details: format!("aggregate for {user_id}: {e}"),
        })?;

    Ok(Some(VersionedAggregate {
        aggregate,
        version: version as u64,
    }))
}

fn stored_version(conn: &Connection, user_id: &str) -> StorageResult<Option<u64>> {
    conn.query_row(
        "SELECT version FROM user_aggregates WHERE user_id = ?1",
        params![user_id],
        |row| row.get::<_, i64>(0),
    )
    .optional()
    .map(|v| v.map(|v| v as u64))
    .map_err(to_storage_err)
}

/// Compare-and-swap write. The version check and the write are one statement,
/// so two writers holding the same version can never both succeed.
pub fn commit_aggregate(
    conn: &Connection,
    aggregate: &UserAggregate,
    expected_version: u64,
) -> StorageResult<u64> {
    let document = serde_json::to_string(aggregate).map_err(|e| StorageError::Corrupt {
        details: format!("serialize aggregate for {}: {e}", aggregate.user_id),
    })?;

    let changed = if expected_version == 0 {
        conn.execute(
            "INSERT INTO user_aggregates (user_id, version, document, created_at, updated_at)
             VALUES (?1, 1, ?2, ?3, ?4)
             ON CONFLICT(user_id) DO NOTHING",
            params![
                aggregate.user_id,
                document,
                ts(&aggregate.created_at),
                ts(&aggregate.updated_at)
            ],
        )
    } else {
        conn.execute(
            "UPDATE user_aggregates
             SET version = version + 1, document = ?2, updated_at = ?3
             WHERE user_id = ?1 AND version = ?4",
            params![
                aggregate.user_id,
                document,
                ts(&aggregate.updated_at),
                expected_version as i64
            ],
        )
    }
    .map_err(to_storage_err)?;

    if changed == 0 {
        return Err(StorageError::VersionConflict {
            key: aggregate.user_id.clone(),
            expected: expected_version,
            found: stored_version(conn, &aggregate.user_id)?,
        });
    }

    Ok(expected_version + 1)
}

/// Up to `limit` user ids greater than `cursor`, ascending.
pub fn list_user_ids_after(
    conn: &Connection,
    cursor: Option<&str>,
    limit: usize,
) -> StorageResult<Vec<String>> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT user_id FROM user_aggregates
             WHERE ?1 IS NULL OR user_id > ?1
             ORDER BY user_id
             LIMIT ?2",
        )
        .map_err(to_storage_err)?;

    let rows = stmt
        .query_map(params![cursor, limit as i64], |row| row.get(0))
        .map_err(to_storage_err)?;

    rows.collect::<Result<Vec<String>, _>>()
        .map_err(to_storage_err)
}

pub fn count_aggregates(conn: &Connection) -> StorageResult<u64> {
    conn.query_row("SELECT COUNT(*) FROM user_aggregates", [], |row| {
        row.get::<_, i64>(0)
    })
    .map(|n| n as u64)
    .map_err(to_storage_err)
}

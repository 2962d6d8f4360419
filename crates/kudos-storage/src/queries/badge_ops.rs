//! Badge catalog and earned-badge rows.

use chrono::{DateTime, Utc};
use kudos_core::{BadgeCategory, BadgeDefinition, StorageError, StorageResult, UserBadge};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use super::{parse_ts, ts};
use crate::to_storage_err;

pub fn upsert_badge_definition(
    conn: &Connection,
    definition: &BadgeDefinition,
    now: DateTime<Utc>,
) -> StorageResult<()> {
    let criteria = serde_json::to_string(&definition.criteria).map_err(|e| StorageError::Corrupt {
        details: format!("serialize criteria for {}: {e}", definition.badge_id),
    })?;

    conn.execute(
        "INSERT INTO badge_definitions (badge_id, name, description, category, criteria, active, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(badge_id) DO UPDATE SET
             name = excluded.name,
             description = excluded.description,
             category = excluded.category,
             criteria = excluded.criteria,
             active = excluded.active,
             updated_at = excluded.updated_at",
        params![
            definition.badge_id,
            definition.name,
            definition.description,
            definition.category.as_str(),
            criteria,
            definition.active,
            ts(&now),
        ],
    )
    .map_err(to_storage_err)?;
    Ok(())
}

pub fn list_badge_definitions(
    conn: &Connection,
    include_inactive: bool,
) -> StorageResult<Vec<BadgeDefinition>> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT badge_id, name, description, category, criteria, active
             FROM badge_definitions
             WHERE ?1 OR active = 1
             ORDER BY badge_id",
        )
        .map_err(to_storage_err)?;

    let rows = stmt
        .query_map(params![include_inactive], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, bool>(5)?,
            ))
        })
        .map_err(to_storage_err)?;

    let mut out = Vec::new();
    for row in rows {
        let (badge_id, name, description, category, criteria, active) =
            row.map_err(to_storage_err)?;
        let category = BadgeCategory::parse(&category).map_err(|e| StorageError::Corrupt {
            details: format!("badge {badge_id}: {e}"),
        })?;
        let criteria = serde_json::from_str(&criteria).map_err(|e| StorageError::Corrupt {
            details: format!("badge {badge_id} criteria: {e}"),
        })?;
        out.push(BadgeDefinition {
            badge_id,
            name,
            description,
            category,
            criteria,
            active,
        });
    }
    Ok(out)
}

fn find_user_badge(
    conn: &Connection,
    user_id: &str,
    badge_id: &str,
) -> StorageResult<Option<UserBadge>> {
    let earned_at: Option<String> = conn
        .query_row(
            "SELECT earned_at FROM user_badges WHERE user_id = ?1 AND badge_id = ?2",
            params![user_id, badge_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(to_storage_err)?;

    earned_at
        .map(|raw| {
            Ok(UserBadge {
                user_id: user_id.to_string(),
                badge_id: badge_id.to_string(),
                earned_at: parse_ts("earned_at", &raw)?,
            })
        })
        .transpose()
}

/// Re-read and insert under one IMMEDIATE transaction. The existing row, if
/// any, is returned untouched.
pub fn insert_user_badge_if_absent(
    conn: &mut Connection,
    user_id: &str,
    badge_id: &str,
    earned_at: DateTime<Utc>,
) -> StorageResult<(UserBadge, bool)> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(to_storage_err)?;

    if let Some(existing) = find_user_badge(&tx, user_id, badge_id)? {
        tx.commit().map_err(to_storage_err)?;
        return Ok((existing, false));
    }

    tx.execute(
        "INSERT INTO user_badges (user_id, badge_id, earned_at) VALUES (?1, ?2, ?3)",
        params![user_id, badge_id, ts(&earned_at)],
    )
    .map_err(to_storage_err)?;
    tx.commit().map_err(to_storage_err)?;

    Ok((
        UserBadge {
            user_id: user_id.to_string(),
            badge_id: badge_id.to_string(),
            earned_at,
        },
        true,
    ))
}

pub fn list_user_badges(conn: &Connection, user_id: &str) -> StorageResult<Vec<UserBadge>> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT badge_id, earned_at FROM user_badges
             WHERE user_id = ?1
             ORDER BY earned_at, badge_id",
        )
        .map_err(to_storage_err)?;

    let rows = stmt
        .query_map(params![user_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })
        .map_err(to_storage_err)?;

    let mut out = Vec::new();
    for row in rows {
        let (badge_id, earned_at) = row.map_err(to_storage_err)?;
        out.push(UserBadge {
            user_id: user_id.to_string(),
            badge_id,
            earned_at: parse_ts("earned_at", &earned_at)?,
        });
    }
    Ok(out)
}

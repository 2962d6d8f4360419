//! SQL for each table, one module per concern.

pub mod aggregate_ops;
pub mod badge_ops;
pub mod maintenance_ops;

use chrono::{DateTime, Utc};
use kudos_core::StorageError;

/// Timestamps are stored as RFC 3339 text.
pub(crate) fn ts(at: &DateTime<Utc>) -> String {
    at.to_rfc3339()
}

pub(crate) fn parse_ts(column: &str, raw: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StorageError::Corrupt {
            details: format!("{column} `{raw}`: {e}"),
        })
}

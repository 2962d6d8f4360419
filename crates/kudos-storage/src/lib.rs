//! # kudos-storage
//!
//! SQLite persistence layer for the Kudos engine.
//! Implements `IAggregateStore` over one writer connection plus a read pool
//! (WAL mode). Aggregates are JSON documents guarded by a version column.

pub mod engine;
pub mod migrations;
pub mod pool;
pub mod pragmas;
pub mod queries;

pub use engine::SqliteAggregateStore;

use kudos_core::StorageError;
use rusqlite::ErrorCode;

/// Map a rusqlite error into the store error space. Lock contention becomes
/// `Busy` so callers can retry it.
pub fn to_storage_err(e: rusqlite::Error) -> StorageError {
    match &e {
        rusqlite::Error::SqliteFailure(f, _)
            if matches!(f.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) =>
        {
            StorageError::Busy
        }
        _ => StorageError::sqlite(e),
    }
}

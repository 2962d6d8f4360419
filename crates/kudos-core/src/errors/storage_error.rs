//! Storage-layer errors for aggregate store operations.

/// Errors that can occur in the storage layer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("Migration failed at version {version}: {message}")]
    MigrationFailed { version: u32, message: String },

    #[error("Database busy (another operation in progress)")]
    Busy,

    /// The optimistic version check failed: someone else committed first.
    #[error("Version conflict on {key}: expected v{expected}, found {found:?}")]
    VersionConflict {
        key: String,
        expected: u64,
        found: Option<u64>,
    },

    #[error("Store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Stored document corrupt: {details}")]
    Corrupt { details: String },
}

impl StorageError {
    /// Helper to wrap any displayable error as a SQLite error.
    pub fn sqlite(e: impl std::fmt::Display) -> Self {
        Self::SqliteError {
            message: e.to_string(),
        }
    }

    /// Whether retrying the same operation can succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Busy | Self::VersionConflict { .. })
    }
}

/// Result alias for store operations.
pub type StorageResult<T> = Result<T, StorageError>;

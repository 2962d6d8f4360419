//! RecoveryAction enum: what to do when an engine operation fails.

use std::fmt;

use super::{KudosError, StorageError};

/// Recommended recovery action for a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Retry the operation (transient failure like a version conflict).
    Retry,
    /// Fall back to a degraded but functional alternative.
    Fallback,
    /// Escalate to the caller. This error cannot be handled silently.
    Escalate,
}

impl RecoveryAction {
    /// Determine the recommended recovery action for a KudosError.
    pub fn for_error(error: &KudosError) -> Self {
        match error {
            // Transient: retry
            KudosError::Conflict { .. } => Self::Retry,
            KudosError::Storage(e) if e.is_transient() => Self::Retry,

            // Store is gone or slow: the write path must not pretend it worked
            KudosError::StoreUnavailable { .. } => Self::Escalate,
            KudosError::Timeout { .. } => Self::Escalate,

            // Caller mistakes: escalate
            KudosError::Validation(_) => Self::Escalate,
            KudosError::Forbidden { .. } => Self::Escalate,
            KudosError::Config(_) => Self::Escalate,

            // Secondary subsystems after a committed write
            KudosError::DegradedRead { .. } => Self::Fallback,

            // Data errors: escalate (likely a bug)
            KudosError::Serialization(_) => Self::Escalate,
            KudosError::Storage(StorageError::Corrupt { .. }) => Self::Escalate,
            KudosError::Storage(_) => Self::Escalate,
        }
    }
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retry => write!(f, "Retry"),
            Self::Fallback => write!(f, "Fallback"),
            Self::Escalate => write!(f, "Escalate"),
        }
    }
}

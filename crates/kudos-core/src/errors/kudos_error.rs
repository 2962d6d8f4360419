use super::StorageError;

/// Top-level error type for the Kudos engine.
/// Store errors convert into this via the `From` impl below.
#[derive(Debug, thiserror::Error)]
pub enum KudosError {
    /// Malformed activity payload, invalid course/week, bad identifiers.
    /// Raised before any store access.
    #[error("validation error: {0}")]
    Validation(String),

    /// Optimistic transaction collision that survived the bounded retries.
    #[error("conflict on user {user_id} after {attempts} attempt(s)")]
    Conflict { user_id: String, attempts: u32 },

    #[error("store unavailable: {reason}")]
    StoreUnavailable { reason: String },

    #[error("store operation `{operation}` timed out after {after_ms}ms")]
    Timeout { operation: String, after_ms: u64 },

    /// Read-and-derive failure after a successful XP commit.
    #[error("degraded read in {component}: {reason}")]
    DegradedRead { component: String, reason: String },

    #[error("operation `{operation}` requires the operator role")]
    Forbidden { operation: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(StorageError),
}

impl From<StorageError> for KudosError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::VersionConflict { key, .. } => Self::Conflict {
                user_id: key,
                attempts: 1,
            },
            StorageError::Busy => Self::Conflict {
                user_id: String::new(),
                attempts: 1,
            },
            StorageError::Unavailable { reason } => Self::StoreUnavailable { reason },
            other => Self::Storage(other),
        }
    }
}

impl KudosError {
    /// Wrap a read-side failure of `component` that happened after a commit.
    /// An already degraded error keeps its original component.
    pub fn degraded(component: &str, source: KudosError) -> Self {
        match source {
            degraded @ Self::DegradedRead { .. } => degraded,
            other => Self::DegradedRead {
                component: component.to_string(),
                reason: other.to_string(),
            },
        }
    }

    /// Errors the caller caused (surfaced as client errors).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Forbidden { .. })
    }

    /// Generic message safe to show to end users. Internal details stay in
    /// the server-side logs.
    pub fn client_message(&self) -> &'static str {
        match self {
            Self::Validation(_) => "The activity could not be accepted. Check the submitted data.",
            Self::Forbidden { .. } => "You are not allowed to perform this operation.",
            Self::Conflict { .. } => "Too many simultaneous updates. Please retry shortly.",
            Self::StoreUnavailable { .. } | Self::Timeout { .. } => {
                "Progress tracking is temporarily unavailable. Please retry later."
            }
            _ => "Something went wrong while updating your progress.",
        }
    }
}

/// Convenience type alias.
pub type KudosResult<T> = Result<T, KudosError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_conflict_maps_to_conflict() {
        let err: KudosError = StorageError::VersionConflict {
            key: "u1".to_string(),
            expected: 3,
            found: Some(4),
        }
        .into();
        assert!(matches!(err, KudosError::Conflict { ref user_id, .. } if user_id == "u1"));
    }

    #[test]
    fn unavailable_maps_to_store_unavailable() {
        let err: KudosError = StorageError::Unavailable {
            reason: "disk gone".to_string(),
        }
        .into();
        assert!(matches!(err, KudosError::StoreUnavailable { .. }));
    }

    #[test]
    fn degraded_wraps_once() {
        let err = KudosError::degraded(
            "badges",
            KudosError::StoreUnavailable {
                reason: "closed".into(),
            },
        );
        assert!(matches!(
            err,
            KudosError::DegradedRead { ref component, ref reason }
                if component == "badges" && reason.contains("closed")
        ));
        let again = KudosError::degraded("quest", err);
        assert!(matches!(again, KudosError::DegradedRead { ref component, .. } if component == "badges"));
    }

    #[test]
    fn client_message_does_not_leak_internals() {
        let err = KudosError::Storage(StorageError::sqlite("no such table: user_aggregates"));
        assert!(!err.client_message().contains("user_aggregates"));
        assert!(!err.is_client_error());
    }
}

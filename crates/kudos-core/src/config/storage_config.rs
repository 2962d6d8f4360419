use serde::{Deserialize, Serialize};

/// Configuration for the aggregate store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the SQLite database. `None` opens an in-memory store.
    pub path: Option<String>,
    /// Number of read-only connections. 0 = default (2).
    pub read_pool_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            read_pool_size: 2,
        }
    }
}

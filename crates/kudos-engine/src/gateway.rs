//! Async front for the blocking store.
//!
//! Every call runs on tokio's blocking pool under a deadline. A call that
//! times out is abandoned, not cancelled: a commit may still land after the
//! caller has seen `Timeout`.

use std::sync::Arc;
use std::time::Duration;

use kudos_core::{IAggregateStore, KudosError, KudosResult, StorageResult};
use tracing::warn;

#[derive(Clone)]
pub struct StoreGateway {
    store: Arc<dyn IAggregateStore>,
    timeout: Duration,
}

impl StoreGateway {
    pub fn new(store: Arc<dyn IAggregateStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `f` against the store on the blocking pool.
    pub async fn call<T, F>(&self, operation: &'static str, f: F) -> KudosResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn IAggregateStore) -> StorageResult<T> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let task = tokio::task::spawn_blocking(move || f(store.as_ref()));

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => result.map_err(KudosError::from),
            Ok(Err(join_err)) => {
                warn!(operation, error = %join_err, "store task did not complete");
                Err(KudosError::StoreUnavailable {
                    reason: format!("{operation}: store task failed"),
                })
            }
            Err(_) => {
                warn!(operation, timeout_ms = self.timeout.as_millis() as u64, "store call timed out");
                Err(KudosError::Timeout {
                    operation: operation.to_string(),
                    after_ms: self.timeout.as_millis() as u64,
                })
            }
        }
    }
}

//! Optimistic read-modify-write of one user's aggregate.
//!
//! Load, mutate in memory, compare-and-swap on the stored version. A lost race
//! reloads and re-applies the mutation from scratch, so the closure must be a
//! pure function of the aggregate it is handed.

use std::sync::Arc;

use kudos_core::config::UpdaterConfig;
use kudos_core::{
    Clock, KudosError, KudosResult, RecoveryAction, UserAggregate, VersionedAggregate,
};
use tracing::{debug, trace};

use crate::gateway::StoreGateway;

/// What the mutation decided.
pub enum Mutation<R> {
    /// Persist the mutated aggregate.
    Write(R),
    /// Nothing changed; leave the stored document alone.
    Skip(R),
}

/// Result of a finished transaction.
#[derive(Debug, Clone)]
pub struct Committed<R> {
    /// The aggregate as stored after this transaction (or as loaded, if skipped).
    pub aggregate: UserAggregate,
    pub version: u64,
    pub written: bool,
    pub attempts: u32,
    pub value: R,
}

#[derive(Clone)]
pub struct OptimisticWriter {
    gateway: StoreGateway,
    retry: UpdaterConfig,
    clock: Arc<dyn Clock>,
}

impl OptimisticWriter {
    pub fn new(gateway: StoreGateway, retry: UpdaterConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            gateway,
            retry,
            clock,
        }
    }

    pub fn gateway(&self) -> &StoreGateway {
        &self.gateway
    }

    pub async fn load(&self, user_id: &str) -> KudosResult<Option<VersionedAggregate>> {
        let uid = user_id.to_string();
        self.gateway
            .call("get_aggregate", move |store| store.get_aggregate(&uid))
            .await
    }

    /// Apply `mutate` to the user's aggregate under optimistic concurrency.
    ///
    /// Returns `None` when the user has no document and `create_if_missing`
    /// is false.
    pub async fn modify<R, F>(
        &self,
        user_id: &str,
        create_if_missing: bool,
        mut mutate: F,
    ) -> KudosResult<Option<Committed<R>>>
    where
        F: FnMut(&mut UserAggregate) -> KudosResult<Mutation<R>>,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;

            let loaded = match self.load(user_id).await {
                Ok(Some(v)) => v,
                Ok(None) if create_if_missing => {
                    VersionedAggregate::unpersisted(UserAggregate::new(user_id, self.clock.now()))
                }
                Ok(None) => return Ok(None),
                Err(e) => {
                    self.backoff_or_fail(user_id, attempt, e).await?;
                    continue;
                }
            };
            trace!(user_id, attempt, version = loaded.version, "aggregate loaded");

            let mut next = loaded.aggregate.clone();
            let value = match mutate(&mut next)? {
                Mutation::Skip(value) => {
                    return Ok(Some(Committed {
                        aggregate: loaded.aggregate,
                        version: loaded.version,
                        written: false,
                        attempts: attempt,
                        value,
                    }))
                }
                Mutation::Write(value) => value,
            };

            let to_store = next.clone();
            let expected = loaded.version;
            let committed = self
                .gateway
                .call("commit_aggregate", move |store| {
                    store.commit_aggregate(&to_store, expected)
                })
                .await;

            match committed {
                Ok(version) => {
                    return Ok(Some(Committed {
                        aggregate: next,
                        version,
                        written: true,
                        attempts: attempt,
                        value,
                    }))
                }
                Err(e) => self.backoff_or_fail(user_id, attempt, e).await?,
            }
        }
    }

    /// Sleep before the next attempt, or turn `error` into the final failure.
    async fn backoff_or_fail(&self, user_id: &str, attempt: u32, error: KudosError) -> KudosResult<()> {
        if RecoveryAction::for_error(&error) != RecoveryAction::Retry {
            return Err(error);
        }
        let retries_used = attempt - 1;
        if retries_used >= self.retry.max_retries {
            return Err(KudosError::Conflict {
                user_id: user_id.to_string(),
                attempts: attempt,
            });
        }
        let delay = self.retry.backoff_for(retries_used);
        debug!(
            user_id,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "transaction conflict, retrying"
        );
        tokio::time::sleep(delay).await;
        Ok(())
    }
}
